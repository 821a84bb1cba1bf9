//! Filter types shared by the fetcher, the CLI and the TUI.
//!
//! The API takes four filters. Three of them come from fixed enumerations
//! (year, province, contract type) and one is free text (keyword). The
//! selector sentinel `"Todos"` means "no constraint" and is modelled as `None`.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Selector label meaning "no filter on this dimension".
pub const ALL_LABEL: &str = "Todos";

/// Reporting year accepted by the API selector (`2015..=2025`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Year(u16);

impl Year {
    pub const MIN: u16 = 2015;
    pub const MAX: u16 = 2025;

    pub fn new(value: u16) -> Result<Self, AppError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::new(
                2,
                format!("Año fuera de rango: {value} (esperado {}-{}).", Self::MIN, Self::MAX),
            ))
        }
    }

    /// Parse a four-digit year string as shown in the selector.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.len() != 4 {
            return Err(AppError::new(2, format!("Año inválido '{trimmed}': se esperan cuatro dígitos.")));
        }
        let value = trimmed
            .parse::<u16>()
            .map_err(|_| AppError::new(2, format!("Año inválido '{trimmed}'.")))?;
        Self::new(value)
    }

    pub fn all() -> impl Iterator<Item = Year> {
        (Self::MIN..=Self::MAX).map(Year)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// First selector entry.
    pub fn first() -> Self {
        Self(Self::MIN)
    }

    pub fn next(self) -> Self {
        if self.0 >= Self::MAX { Self(Self::MIN) } else { Self(self.0 + 1) }
    }

    pub fn prev(self) -> Self {
        if self.0 <= Self::MIN { Self(Self::MAX) } else { Self(self.0 - 1) }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Ecuadorian provinces offered by the region selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Province {
    Azuay,
    Bolivar,
    Canar,
    Carchi,
    Chimborazo,
    Cotopaxi,
    ElOro,
    Esmeraldas,
    Galapagos,
    Guayas,
    Imbabura,
    Loja,
    LosRios,
    Manabi,
    MoronaSantiago,
    Napo,
    Orellana,
    Pastaza,
    Pichincha,
    SantaElena,
    SantoDomingoDeLosTsachilas,
    Sucumbios,
    Tungurahua,
    ZamoraChinchipe,
}

impl Province {
    pub const ALL: [Province; 24] = [
        Province::Azuay,
        Province::Bolivar,
        Province::Canar,
        Province::Carchi,
        Province::Chimborazo,
        Province::Cotopaxi,
        Province::ElOro,
        Province::Esmeraldas,
        Province::Galapagos,
        Province::Guayas,
        Province::Imbabura,
        Province::Loja,
        Province::LosRios,
        Province::Manabi,
        Province::MoronaSantiago,
        Province::Napo,
        Province::Orellana,
        Province::Pastaza,
        Province::Pichincha,
        Province::SantaElena,
        Province::SantoDomingoDeLosTsachilas,
        Province::Sucumbios,
        Province::Tungurahua,
        Province::ZamoraChinchipe,
    ];

    /// Name as the API expects it in the `region` parameter.
    pub fn api_name(self) -> &'static str {
        match self {
            Province::Azuay => "AZUAY",
            Province::Bolivar => "BOLÍVAR",
            Province::Canar => "CAÑAR",
            Province::Carchi => "CARCHI",
            Province::Chimborazo => "CHIMBORAZO",
            Province::Cotopaxi => "COTOPAXI",
            Province::ElOro => "EL ORO",
            Province::Esmeraldas => "ESMERALDAS",
            Province::Galapagos => "GALÁPAGOS",
            Province::Guayas => "GUAYAS",
            Province::Imbabura => "IMBABURA",
            Province::Loja => "LOJA",
            Province::LosRios => "LOS RÍOS",
            Province::Manabi => "MANABÍ",
            Province::MoronaSantiago => "MORONA SANTIAGO",
            Province::Napo => "NAPO",
            Province::Orellana => "ORELLANA",
            Province::Pastaza => "PASTAZA",
            Province::Pichincha => "PICHINCHA",
            Province::SantaElena => "SANTA ELENA",
            Province::SantoDomingoDeLosTsachilas => "SANTO DOMINGO DE LOS TSÁCHILAS",
            Province::Sucumbios => "SUCUMBÍOS",
            Province::Tungurahua => "TUNGURAHUA",
            Province::ZamoraChinchipe => "ZAMORA CHINCHIPE",
        }
    }

    /// Parse a selector value; `"Todos"` yields `None`.
    pub fn from_label(raw: &str) -> Result<Option<Self>, AppError> {
        parse_selector(raw, &Self::ALL, |p| p.api_name(), "provincia")
    }
}

/// Contracting methods offered by the contract-type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ContractType {
    SubastaInversaElectronica,
    MenorCuantia,
    Cotizacion,
    ContratacionDirecta,
    Licitacion,
    CatalogoElectronico,
    BienesYServiciosUnicos,
}

impl ContractType {
    pub const ALL: [ContractType; 7] = [
        ContractType::SubastaInversaElectronica,
        ContractType::MenorCuantia,
        ContractType::Cotizacion,
        ContractType::ContratacionDirecta,
        ContractType::Licitacion,
        ContractType::CatalogoElectronico,
        ContractType::BienesYServiciosUnicos,
    ];

    /// Name as the API expects it in the `type` parameter.
    pub fn api_name(self) -> &'static str {
        match self {
            ContractType::SubastaInversaElectronica => "Subasta Inversa Electrónica",
            ContractType::MenorCuantia => "Menor Cuantía",
            ContractType::Cotizacion => "Cotización",
            ContractType::ContratacionDirecta => "Contratación directa",
            ContractType::Licitacion => "Licitación",
            ContractType::CatalogoElectronico => "Catálogo electrónico",
            ContractType::BienesYServiciosUnicos => "Bienes y Servicios únicos",
        }
    }

    /// Parse a selector value; `"Todos"` yields `None`.
    pub fn from_label(raw: &str) -> Result<Option<Self>, AppError> {
        parse_selector(raw, &Self::ALL, |c| c.api_name(), "tipo de contratación")
    }
}

/// Accepts the API label (case-insensitive) or the CLI value name.
fn parse_selector<T: Copy + ValueEnum>(
    raw: &str,
    all: &[T],
    label: impl Fn(T) -> &'static str,
    what: &str,
) -> Result<Option<T>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_LABEL) {
        return Ok(None);
    }
    let wanted = trimmed.to_uppercase();
    if let Some(found) = all.iter().copied().find(|v| label(*v).to_uppercase() == wanted) {
        return Ok(Some(found));
    }
    T::from_str(trimmed, true)
        .map(Some)
        .map_err(|_| AppError::new(2, format!("Valor de {what} desconocido: '{trimmed}'.")))
}

/// Step through `None` ("Todos") followed by every entry of `all`, wrapping.
pub fn cycle_selector<T: Copy + PartialEq>(all: &[T], current: Option<T>, delta: i32) -> Option<T> {
    let len = all.len() as i32 + 1;
    let idx = match current {
        None => 0,
        Some(v) => all.iter().position(|x| *x == v).map(|i| i as i32 + 1).unwrap_or(0),
    };
    let next = (idx + delta).rem_euclid(len);
    if next == 0 { None } else { Some(all[(next - 1) as usize]) }
}

/// Display label for an optional selector value.
pub fn selector_label<T: Copy>(value: Option<T>, label: impl Fn(T) -> &'static str) -> &'static str {
    value.map(label).unwrap_or(ALL_LABEL)
}

/// The four user-selected filters; also the memoization key for fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSet {
    pub year: Year,
    pub province: Option<Province>,
    pub contract_type: Option<ContractType>,
    pub keyword: Option<String>,
}

impl FilterSet {
    pub fn new(year: Year) -> Self {
        Self {
            year,
            province: None,
            contract_type: None,
            keyword: None,
        }
    }

    /// Build filters from the raw selector texts handed over by a UI shell.
    pub fn from_inputs(year: &str, region: &str, contract_type: &str, keyword: &str) -> Result<Self, AppError> {
        Ok(Self {
            year: Year::parse(year)?,
            province: Province::from_label(region)?,
            contract_type: ContractType::from_label(contract_type)?,
            keyword: keyword_filter(keyword),
        })
    }

    /// Request parameters; absent filters are omitted, not sent as literals.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("year", self.year.to_string())];
        if let Some(p) = self.province {
            params.push(("region", p.api_name().to_string()));
        }
        if let Some(t) = self.contract_type {
            params.push(("type", t.api_name().to_string()));
        }
        if let Some(k) = &self.keyword {
            params.push(("keyword", k.clone()));
        }
        params
    }
}

/// Empty keyword means no filter; anything else is sent as typed.
pub fn keyword_filter(raw: &str) -> Option<String> {
    if raw.is_empty() { None } else { Some(raw.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todos_maps_to_absent_filters() {
        let f = FilterSet::from_inputs("2022", "Todos", "Todos", "").unwrap();
        assert_eq!(f.province, None);
        assert_eq!(f.contract_type, None);
        assert_eq!(f.keyword, None);
        assert_eq!(f.query_params(), vec![("year", "2022".to_string())]);
    }

    #[test]
    fn query_params_use_api_names() {
        let f = FilterSet::from_inputs("2019", "santo domingo de los tsáchilas", "Licitación", "agua").unwrap();
        assert_eq!(
            f.query_params(),
            vec![
                ("year", "2019".to_string()),
                ("region", "SANTO DOMINGO DE LOS TSÁCHILAS".to_string()),
                ("type", "Licitación".to_string()),
                ("keyword", "agua".to_string()),
            ]
        );
    }

    #[test]
    fn selectors_accept_cli_value_names() {
        assert_eq!(Province::from_label("los-rios").unwrap(), Some(Province::LosRios));
        assert_eq!(
            ContractType::from_label("menor-cuantia").unwrap(),
            Some(ContractType::MenorCuantia)
        );
        assert!(Province::from_label("ATLANTIS").is_err());
    }

    #[test]
    fn year_range_is_enforced() {
        assert!(Year::parse("2014").is_err());
        assert!(Year::parse("2026").is_err());
        assert!(Year::parse("22").is_err());
        assert_eq!(Year::parse("2025").unwrap().value(), 2025);
        assert_eq!(Year::all().count(), 11);
        assert_eq!(Year::new(2025).unwrap().next(), Year::first());
    }

    #[test]
    fn cycle_selector_wraps_through_todos() {
        let all = &Province::ALL;
        assert_eq!(cycle_selector(all, None, 1), Some(Province::Azuay));
        assert_eq!(cycle_selector(all, Some(Province::Azuay), -1), None);
        assert_eq!(cycle_selector(all, None, -1), Some(Province::ZamoraChinchipe));
        assert_eq!(cycle_selector(all, Some(Province::ZamoraChinchipe), 1), None);
    }
}
