//! Field taxonomy - the closed set of registry fields recovered from a filing

use crate::tier::ValidationTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A target field of the trial registry record
///
/// The set is closed: every field has exactly one reference column, one
/// validation tier and one prompt description, so no field can reach the
/// validator without a defined acceptance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Registry identifier (NCT number)
    NctNumber,
    /// Official or brief study title
    StudyTitle,
    /// Public registry URL
    StudyUrl,
    /// Study acronym or short name
    Acronym,
    /// Recruitment status
    StudyStatus,
    /// Lay summary of the study
    BriefSummary,
    /// Whether results are available
    StudyResults,
    /// Conditions or diseases studied
    Conditions,
    /// Interventions with type labels
    Interventions,
    /// Primary outcome measures
    PrimaryOutcomeMeasures,
    /// Secondary outcome measures
    SecondaryOutcomeMeasures,
    /// Other (exploratory) outcome measures
    OtherOutcomeMeasures,
    /// Lead sponsor
    Sponsor,
    /// Collaborating organizations
    Collaborators,
    /// Eligible sex
    Sex,
    /// Eligible age groups
    Age,
    /// Trial phase(s)
    Phases,
    /// Planned or actual enrollment count
    Enrollment,
    /// Funder category
    FunderType,
    /// Interventional or observational
    StudyType,
    /// Allocation, masking and model description
    StudyDesign,
    /// Secondary identifiers
    OtherIds,
    /// Study start date
    StartDate,
    /// Primary completion date
    PrimaryCompletionDate,
    /// Study completion date
    CompletionDate,
    /// Registry first-posted date
    FirstPosted,
    /// Registry results-first-posted date
    ResultsFirstPosted,
    /// Registry last-update date
    LastUpdatePosted,
    /// Study sites
    Locations,
    /// Documents attached to the registry entry
    StudyDocuments,
}

/// Fields that tend to appear together and are asked for in one oracle call
///
/// A pending field absent from every group is queried alone.
pub const FIELD_GROUPS: &[&[FieldName]] = &[
    &[FieldName::NctNumber, FieldName::StudyTitle, FieldName::Acronym],
    &[FieldName::StudyStatus, FieldName::StudyType, FieldName::Phases],
    &[FieldName::Enrollment, FieldName::Sex, FieldName::Age],
    &[FieldName::Conditions, FieldName::Interventions],
    &[FieldName::PrimaryOutcomeMeasures],
    &[FieldName::SecondaryOutcomeMeasures],
    &[FieldName::OtherOutcomeMeasures],
    &[FieldName::Sponsor, FieldName::Collaborators, FieldName::FunderType],
    &[
        FieldName::StartDate,
        FieldName::PrimaryCompletionDate,
        FieldName::CompletionDate,
    ],
];

const ALL: [FieldName; 30] = [
    FieldName::NctNumber,
    FieldName::StudyTitle,
    FieldName::StudyUrl,
    FieldName::Acronym,
    FieldName::StudyStatus,
    FieldName::BriefSummary,
    FieldName::StudyResults,
    FieldName::Conditions,
    FieldName::Interventions,
    FieldName::PrimaryOutcomeMeasures,
    FieldName::SecondaryOutcomeMeasures,
    FieldName::OtherOutcomeMeasures,
    FieldName::Sponsor,
    FieldName::Collaborators,
    FieldName::Sex,
    FieldName::Age,
    FieldName::Phases,
    FieldName::Enrollment,
    FieldName::FunderType,
    FieldName::StudyType,
    FieldName::StudyDesign,
    FieldName::OtherIds,
    FieldName::StartDate,
    FieldName::PrimaryCompletionDate,
    FieldName::CompletionDate,
    FieldName::FirstPosted,
    FieldName::ResultsFirstPosted,
    FieldName::LastUpdatePosted,
    FieldName::Locations,
    FieldName::StudyDocuments,
];

// Asked first; the rest follow in enumeration order.
const PRIORITY: [FieldName; 17] = [
    FieldName::NctNumber,
    FieldName::StudyTitle,
    FieldName::BriefSummary,
    FieldName::Conditions,
    FieldName::Interventions,
    FieldName::PrimaryOutcomeMeasures,
    FieldName::SecondaryOutcomeMeasures,
    FieldName::Sponsor,
    FieldName::Phases,
    FieldName::Enrollment,
    FieldName::StudyType,
    FieldName::StudyDesign,
    FieldName::Sex,
    FieldName::Age,
    FieldName::StartDate,
    FieldName::CompletionDate,
    FieldName::OtherOutcomeMeasures,
];

impl FieldName {
    /// Every field, in enumeration order
    pub fn all() -> &'static [FieldName] {
        &ALL
    }

    /// Fields in the order the extraction loop visits them
    pub fn extraction_order() -> Vec<FieldName> {
        let mut order: Vec<FieldName> = PRIORITY.to_vec();
        order.extend(ALL.iter().copied().filter(|f| !PRIORITY.contains(f)));
        order
    }

    /// Fields a source document is expected to contain
    ///
    /// Registry-only fields are left out unless explicitly requested.
    pub fn document_targets(include_registry: bool) -> Vec<FieldName> {
        Self::extraction_order()
            .into_iter()
            .filter(|f| include_registry || f.tier() != ValidationTier::RegistryOnly)
            .collect()
    }

    /// Snake-case field name as used in prompts and checkpoint files
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::NctNumber => "nct_number",
            FieldName::StudyTitle => "study_title",
            FieldName::StudyUrl => "study_url",
            FieldName::Acronym => "acronym",
            FieldName::StudyStatus => "study_status",
            FieldName::BriefSummary => "brief_summary",
            FieldName::StudyResults => "study_results",
            FieldName::Conditions => "conditions",
            FieldName::Interventions => "interventions",
            FieldName::PrimaryOutcomeMeasures => "primary_outcome_measures",
            FieldName::SecondaryOutcomeMeasures => "secondary_outcome_measures",
            FieldName::OtherOutcomeMeasures => "other_outcome_measures",
            FieldName::Sponsor => "sponsor",
            FieldName::Collaborators => "collaborators",
            FieldName::Sex => "sex",
            FieldName::Age => "age",
            FieldName::Phases => "phases",
            FieldName::Enrollment => "enrollment",
            FieldName::FunderType => "funder_type",
            FieldName::StudyType => "study_type",
            FieldName::StudyDesign => "study_design",
            FieldName::OtherIds => "other_ids",
            FieldName::StartDate => "start_date",
            FieldName::PrimaryCompletionDate => "primary_completion_date",
            FieldName::CompletionDate => "completion_date",
            FieldName::FirstPosted => "first_posted",
            FieldName::ResultsFirstPosted => "results_first_posted",
            FieldName::LastUpdatePosted => "last_update_posted",
            FieldName::Locations => "locations",
            FieldName::StudyDocuments => "study_documents",
        }
    }

    /// Parse a field from its snake-case name or its reference column
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim();
        ALL.iter().copied().find(|f| {
            f.as_str().eq_ignore_ascii_case(needle)
                || f.reference_column().eq_ignore_ascii_case(needle)
        })
    }

    /// Column name of this field in the reference registry export
    pub fn reference_column(&self) -> &'static str {
        match self {
            FieldName::NctNumber => "NCT Number",
            FieldName::StudyTitle => "Study Title",
            FieldName::StudyUrl => "Study URL",
            FieldName::Acronym => "Acronym",
            FieldName::StudyStatus => "Study Status",
            FieldName::BriefSummary => "Brief Summary",
            FieldName::StudyResults => "Study Results",
            FieldName::Conditions => "Conditions",
            FieldName::Interventions => "Interventions",
            FieldName::PrimaryOutcomeMeasures => "Primary Outcome Measures",
            FieldName::SecondaryOutcomeMeasures => "Secondary Outcome Measures",
            FieldName::OtherOutcomeMeasures => "Other Outcome Measures",
            FieldName::Sponsor => "Sponsor",
            FieldName::Collaborators => "Collaborators",
            FieldName::Sex => "Sex",
            FieldName::Age => "Age",
            FieldName::Phases => "Phases",
            FieldName::Enrollment => "Enrollment",
            FieldName::FunderType => "Funder Type",
            FieldName::StudyType => "Study Type",
            FieldName::StudyDesign => "Study Design",
            FieldName::OtherIds => "Other IDs",
            FieldName::StartDate => "Start Date",
            FieldName::PrimaryCompletionDate => "Primary Completion Date",
            FieldName::CompletionDate => "Completion Date",
            FieldName::FirstPosted => "First Posted",
            FieldName::ResultsFirstPosted => "Results First Posted",
            FieldName::LastUpdatePosted => "Last Update Posted",
            FieldName::Locations => "Locations",
            FieldName::StudyDocuments => "Study Documents",
        }
    }

    /// Validation tier governing how this field's values are accepted
    pub fn tier(&self) -> ValidationTier {
        match self {
            FieldName::NctNumber
            | FieldName::StudyTitle
            | FieldName::Acronym
            | FieldName::Conditions
            | FieldName::Sponsor
            | FieldName::Collaborators
            | FieldName::Phases
            | FieldName::Enrollment
            | FieldName::OtherIds
            | FieldName::StartDate
            | FieldName::PrimaryCompletionDate
            | FieldName::CompletionDate
            | FieldName::Locations => ValidationTier::Verbatim,

            FieldName::BriefSummary
            | FieldName::StudyDesign
            | FieldName::StudyResults
            | FieldName::Interventions
            | FieldName::PrimaryOutcomeMeasures
            | FieldName::SecondaryOutcomeMeasures
            | FieldName::OtherOutcomeMeasures => ValidationTier::Summary,

            FieldName::StudyStatus
            | FieldName::StudyType
            | FieldName::Sex
            | FieldName::Age
            | FieldName::FunderType => ValidationTier::Inferred,

            FieldName::StudyUrl
            | FieldName::FirstPosted
            | FieldName::ResultsFirstPosted
            | FieldName::LastUpdatePosted
            | FieldName::StudyDocuments => ValidationTier::RegistryOnly,
        }
    }

    /// Whether the value is a semicolon-delimited list
    pub fn is_multi_value(&self) -> bool {
        matches!(
            self,
            FieldName::Conditions
                | FieldName::Interventions
                | FieldName::Collaborators
                | FieldName::Phases
                | FieldName::OtherIds
                | FieldName::Locations
                | FieldName::Age
                | FieldName::PrimaryOutcomeMeasures
                | FieldName::SecondaryOutcomeMeasures
                | FieldName::OtherOutcomeMeasures
                | FieldName::StudyDocuments
        )
    }

    /// Whether this field is extracted with the outcome-measure strategy
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            FieldName::PrimaryOutcomeMeasures
                | FieldName::SecondaryOutcomeMeasures
                | FieldName::OtherOutcomeMeasures
        )
    }

    /// One-line description handed to the oracle alongside the field name
    pub fn description(&self) -> &'static str {
        match self {
            FieldName::NctNumber => "ClinicalTrials.gov identifier in the form NCT followed by 8 digits",
            FieldName::StudyTitle => "Full official title of the study",
            FieldName::StudyUrl => "ClinicalTrials.gov URL of the study",
            FieldName::Acronym => "Short name or acronym of the study",
            FieldName::StudyStatus => "Recruitment status, e.g. RECRUITING, COMPLETED, TERMINATED",
            FieldName::BriefSummary => "Short plain-language summary of the study purpose",
            FieldName::StudyResults => "Whether results are available (YES or NO)",
            FieldName::Conditions => "Diseases or conditions studied, separated by semicolons",
            FieldName::Interventions => "Interventions with type prefix, e.g. DRUG: Name; DEVICE: Name",
            FieldName::PrimaryOutcomeMeasures => "Primary outcome measures with time frames",
            FieldName::SecondaryOutcomeMeasures => "Secondary outcome measures with time frames",
            FieldName::OtherOutcomeMeasures => "Other or exploratory outcome measures with time frames",
            FieldName::Sponsor => "Lead sponsor organization",
            FieldName::Collaborators => "Collaborating organizations, separated by semicolons",
            FieldName::Sex => "Eligible sex: ALL, FEMALE or MALE",
            FieldName::Age => "Eligible age groups: CHILD, ADULT, OLDER_ADULT",
            FieldName::Phases => "Trial phase(s) as written in the document, e.g. Phase 2 or Phase 1/Phase 2",
            FieldName::Enrollment => "Planned or actual number of participants",
            FieldName::FunderType => "Funder category: INDUSTRY, NIH, OTHER_GOV, OTHER",
            FieldName::StudyType => "INTERVENTIONAL or OBSERVATIONAL",
            FieldName::StudyDesign => "Allocation, intervention model, masking and primary purpose",
            FieldName::OtherIds => "Other study identifiers such as protocol numbers",
            FieldName::StartDate => "Date the study started or will start",
            FieldName::PrimaryCompletionDate => "Date of final data collection for the primary outcome",
            FieldName::CompletionDate => "Date the study ended or will end",
            FieldName::FirstPosted => "Date first posted on the registry",
            FieldName::ResultsFirstPosted => "Date results were first posted on the registry",
            FieldName::LastUpdatePosted => "Date of the last registry update",
            FieldName::Locations => "Study sites, separated by semicolons",
            FieldName::StudyDocuments => "Documents attached to the registry entry",
        }
    }

    /// The co-occurrence group containing this field, if any
    pub fn group(&self) -> Option<&'static [FieldName]> {
        FIELD_GROUPS.iter().copied().find(|g| g.contains(self))
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_fields_are_unique() {
        let names: HashSet<_> = FieldName::all().iter().map(|f| f.as_str()).collect();
        assert_eq!(names.len(), 30);
        let columns: HashSet<_> = FieldName::all().iter().map(|f| f.reference_column()).collect();
        assert_eq!(columns.len(), 30);
    }

    #[test]
    fn test_parse_round_trip() {
        for field in FieldName::all() {
            assert_eq!(FieldName::parse(field.as_str()), Some(*field));
            assert_eq!(FieldName::parse(field.reference_column()), Some(*field));
        }
        assert_eq!(FieldName::parse("NCT NUMBER"), Some(FieldName::NctNumber));
        assert!(FieldName::parse("eligibility_vibes").is_none());
    }

    #[test]
    fn test_extraction_order_is_a_permutation() {
        let order = FieldName::extraction_order();
        assert_eq!(order.len(), 30);
        assert_eq!(order[0], FieldName::NctNumber);
        let unique: HashSet<_> = order.iter().collect();
        assert_eq!(unique.len(), 30);
    }

    #[test]
    fn test_document_targets_skip_registry_fields() {
        let targets = FieldName::document_targets(false);
        assert_eq!(targets.len(), 25);
        assert!(!targets.contains(&FieldName::FirstPosted));
        assert_eq!(FieldName::document_targets(true).len(), 30);
    }

    #[test]
    fn test_groups_are_disjoint() {
        let mut seen = HashSet::new();
        for group in FIELD_GROUPS {
            for field in group.iter() {
                assert!(seen.insert(*field), "{} appears in two groups", field);
            }
        }
        assert_eq!(FieldName::Age.group().map(|g| g.len()), Some(3));
        assert!(FieldName::Locations.group().is_none());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FieldName::PrimaryOutcomeMeasures).unwrap();
        assert_eq!(json, "\"primary_outcome_measures\"");
    }
}
