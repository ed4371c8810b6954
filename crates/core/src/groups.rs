//! Obligation group codes and registry country types.
//!
//! The codes must match the `companies_groups.code` values seeded by the
//! initial migration.

/// Fluorinated gases, EU-established undertakings.
pub const FGASES_EU_GROUP_CODE: &str = "f-gases-eu";

/// Fluorinated gases, non-EU undertakings.
pub const FGASES_NONEU_GROUP_CODE: &str = "f-gases-noneu";

/// Ozone-depleting substances.
pub const ODS_GROUP_CODE: &str = "ods";

/// Passenger car manufacturers.
pub const CARS_GROUP_CODE: &str = "cars";

/// Light commercial vehicle manufacturers.
pub const VANS_GROUP_CODE: &str = "vans";

/// Groups synchronized from the BDR registry.
pub const BDR_GROUP_CODES: &[&str] = &[CARS_GROUP_CODE, VANS_GROUP_CODE];

/// Groups synchronized from the European Cache Registry.
pub const ECR_GROUP_CODES: &[&str] = &[ODS_GROUP_CODE, FGASES_EU_GROUP_CODE, FGASES_NONEU_GROUP_CODE];

/// Groups synchronized from the FGases (FCS) registry.
pub const FGASES_GROUP_CODES: &[&str] = &[FGASES_EU_GROUP_CODE, FGASES_NONEU_GROUP_CODE];

/// Country type reported by ECR/FCS for EU member states.
pub const COUNTRY_TYPE_EU: &str = "EU_TYPE";

/// Country type reported by ECR/FCS for non-EU countries.
pub const COUNTRY_TYPE_NONEU: &str = "NONEU_TYPE";

/// Country type reported by ECR/FCS when the classification is unclear.
pub const COUNTRY_TYPE_AMBIGUOUS: &str = "AMBIGUOUS_TYPE";

/// Groups whose companies are listed without a passed registry check.
///
/// Every other group only shows companies with `check_passed = true`.
pub const ALWAYS_VISIBLE_GROUP_CODES: &[&str] = BDR_GROUP_CODES;

/// Pick the F-gases group for a company based on its country type.
///
/// Anything that is not explicitly EU (including ambiguous) is non-EU.
pub fn fgases_group_for_country_type(country_type: &str) -> &'static str {
    if country_type == COUNTRY_TYPE_EU {
        FGASES_EU_GROUP_CODE
    } else {
        FGASES_NONEU_GROUP_CODE
    }
}
