//! Synchronization with the external company registries.
//!
//! Three registries feed the service: BDR (cars and vans), the European Cache
//! Registry (ODS and F-gases) and FGases/FCS. Each is wrapped in a
//! [`Registry`] that yields normalized [`RegistryCompany`] and
//! [`RegistryPerson`] records; the [`fetch::Fetcher`] writes them to the
//! database and reconciles the person-company links.

pub mod bdr;
pub mod client;
pub mod config;
pub mod ecr;
pub mod fetch;
pub mod fgases;
pub mod mock;
pub mod records;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

pub use client::{RegistryClient, RegistryError};
pub use config::RegistryConfig;
pub use records::{CompanyRef, Rejected, RegistryCompany, RegistryPerson};

/// A source of companies and contact persons.
///
/// A list that cannot be retrieved is an error and the whole fetch stops.
/// Individual records that cannot be decoded or normalized come back as
/// [`Rejected`] so the fetch report can list them.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Display name used in logs and fetch reports.
    fn name(&self) -> &'static str;

    /// Group codes this registry is authoritative for.
    fn group_codes(&self) -> &'static [&'static str];

    async fn companies(&self) -> Result<Vec<Result<RegistryCompany, Rejected>>, RegistryError>;

    async fn persons(&self) -> Result<Vec<Result<RegistryPerson, Rejected>>, RegistryError>;
}

/// The registries that can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Bdr,
    Ecr,
    Fgases,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 3] = [Self::Bdr, Self::Ecr, Self::Fgases];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bdr => "bdr",
            Self::Ecr => "ecr",
            Self::Fgases => "fgases",
        }
    }

    pub fn group_codes(self) -> &'static [&'static str] {
        use notifications_core::groups::{BDR_GROUP_CODES, ECR_GROUP_CODES, FGASES_GROUP_CODES};
        match self {
            Self::Bdr => BDR_GROUP_CODES,
            Self::Ecr => ECR_GROUP_CODES,
            Self::Fgases => FGASES_GROUP_CODES,
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bdr" => Ok(Self::Bdr),
            "ecr" => Ok(Self::Ecr),
            "fgases" | "fcs" => Ok(Self::Fgases),
            other => Err(RegistryError::UnknownRegistry(other.to_string())),
        }
    }
}

/// Build the registry for `kind`, or its fixture-backed mock when `test` is set.
pub fn build_registry(
    kind: RegistryKind,
    config: &RegistryConfig,
    test: bool,
) -> Result<Box<dyn Registry>, RegistryError> {
    if test {
        return Ok(Box::new(mock::MockRegistry::new(kind)));
    }
    let registry: Box<dyn Registry> = match kind {
        RegistryKind::Bdr => Box::new(bdr::BdrRegistry::new(config)?),
        RegistryKind::Ecr => Box::new(ecr::EcrRegistry::new(config)?),
        RegistryKind::Fgases => Box::new(fgases::FgasesRegistry::new(config)?),
    };
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_registry_names() {
        assert_eq!("BDR".parse::<RegistryKind>().unwrap(), RegistryKind::Bdr);
        assert_eq!("ecr".parse::<RegistryKind>().unwrap(), RegistryKind::Ecr);
        assert_eq!("fcs".parse::<RegistryKind>().unwrap(), RegistryKind::Fgases);
        assert_matches!(
            "ods".parse::<RegistryKind>(),
            Err(RegistryError::UnknownRegistry(name)) if name == "ods"
        );
    }

    #[test]
    fn test_flag_selects_mock() {
        let registry = build_registry(RegistryKind::Bdr, &RegistryConfig::default(), true).unwrap();
        assert_eq!(registry.name(), mock::MockRegistry::new(RegistryKind::Bdr).name());
    }
}
