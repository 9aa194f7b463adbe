//! Rule-based clause detectors: one case-insensitive regex per clause type,
//! grouped into risk tiers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rights::InternalCategory;

/// Risk tier of a clause. `LowRisk` holds user-protective clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    HighRisk,
    MediumRisk,
    LowRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClauseType {
    // high risk
    Arbitration,
    ClassActionWaiver,
    UnilateralChanges,
    DataSaleOrSharing,
    AutoRenewalFriction,
    NegativeOptionBilling,
    DelegationArbitrability,
    // medium risk
    ArbitrationCarveouts,
    VagueConsent,
    LimitedRetentionDisclosure,
    MoralRightsWaiver,
    JuryTrialWaiver,
    LiabilityLimitation,
    AlgorithmicProcessing,
    TerminationWithoutNotice,
    // protective
    ClearOptOut,
    SelfServiceDeletion,
    NoDataSale,
    TransparentRetention,
    PlainLanguage,
    OwnershipRetention,
    DataExport,
}

impl ClauseType {
    pub const ALL: [ClauseType; 22] = [
        ClauseType::Arbitration,
        ClauseType::ClassActionWaiver,
        ClauseType::UnilateralChanges,
        ClauseType::DataSaleOrSharing,
        ClauseType::AutoRenewalFriction,
        ClauseType::NegativeOptionBilling,
        ClauseType::DelegationArbitrability,
        ClauseType::ArbitrationCarveouts,
        ClauseType::VagueConsent,
        ClauseType::LimitedRetentionDisclosure,
        ClauseType::MoralRightsWaiver,
        ClauseType::JuryTrialWaiver,
        ClauseType::LiabilityLimitation,
        ClauseType::AlgorithmicProcessing,
        ClauseType::TerminationWithoutNotice,
        ClauseType::ClearOptOut,
        ClauseType::SelfServiceDeletion,
        ClauseType::NoDataSale,
        ClauseType::TransparentRetention,
        ClauseType::PlainLanguage,
        ClauseType::OwnershipRetention,
        ClauseType::DataExport,
    ];

    /// Wire/config name, e.g. `CLASS_ACTION_WAIVER`.
    pub fn name(&self) -> &'static str {
        match self {
            ClauseType::Arbitration => "ARBITRATION",
            ClauseType::ClassActionWaiver => "CLASS_ACTION_WAIVER",
            ClauseType::UnilateralChanges => "UNILATERAL_CHANGES",
            ClauseType::DataSaleOrSharing => "DATA_SALE_OR_SHARING",
            ClauseType::AutoRenewalFriction => "AUTO_RENEWAL_FRICTION",
            ClauseType::NegativeOptionBilling => "NEGATIVE_OPTION_BILLING",
            ClauseType::DelegationArbitrability => "DELEGATION_ARBITRABILITY",
            ClauseType::ArbitrationCarveouts => "ARBITRATION_CARVEOUTS",
            ClauseType::VagueConsent => "VAGUE_CONSENT",
            ClauseType::LimitedRetentionDisclosure => "LIMITED_RETENTION_DISCLOSURE",
            ClauseType::MoralRightsWaiver => "MORAL_RIGHTS_WAIVER",
            ClauseType::JuryTrialWaiver => "JURY_TRIAL_WAIVER",
            ClauseType::LiabilityLimitation => "LIABILITY_LIMITATION",
            ClauseType::AlgorithmicProcessing => "ALGORITHMIC_PROCESSING",
            ClauseType::TerminationWithoutNotice => "TERMINATION_WITHOUT_NOTICE",
            ClauseType::ClearOptOut => "CLEAR_OPT_OUT",
            ClauseType::SelfServiceDeletion => "SELF_SERVICE_DELETION",
            ClauseType::NoDataSale => "NO_DATA_SALE",
            ClauseType::TransparentRetention => "TRANSPARENT_RETENTION",
            ClauseType::PlainLanguage => "PLAIN_LANGUAGE",
            ClauseType::OwnershipRetention => "OWNERSHIP_RETENTION",
            ClauseType::DataExport => "DATA_EXPORT",
        }
    }

    pub fn from_name(name: &str) -> Option<ClauseType> {
        ClauseType::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn tier(&self) -> RiskTier {
        use ClauseType::*;
        match self {
            Arbitration
            | ClassActionWaiver
            | UnilateralChanges
            | DataSaleOrSharing
            | AutoRenewalFriction
            | NegativeOptionBilling
            | DelegationArbitrability => RiskTier::HighRisk,
            ArbitrationCarveouts
            | VagueConsent
            | LimitedRetentionDisclosure
            | MoralRightsWaiver
            | JuryTrialWaiver
            | LiabilityLimitation
            | AlgorithmicProcessing
            | TerminationWithoutNotice => RiskTier::MediumRisk,
            ClearOptOut
            | SelfServiceDeletion
            | NoDataSale
            | TransparentRetention
            | PlainLanguage
            | OwnershipRetention
            | DataExport => RiskTier::LowRisk,
        }
    }

    /// Rubric weight used when the configuration does not override it.
    pub fn default_weight(&self) -> f64 {
        use ClauseType::*;
        match self {
            Arbitration | ClassActionWaiver => -15.0,
            UnilateralChanges => -12.0,
            DataSaleOrSharing | DelegationArbitrability => -10.0,
            AutoRenewalFriction | NegativeOptionBilling => -8.0,
            ArbitrationCarveouts | JuryTrialWaiver | LiabilityLimitation => -6.0,
            TerminationWithoutNotice => -6.0,
            VagueConsent | LimitedRetentionDisclosure | MoralRightsWaiver => -5.0,
            AlgorithmicProcessing => -4.0,
            NoDataSale => 6.0,
            ClearOptOut | SelfServiceDeletion | OwnershipRetention => 5.0,
            TransparentRetention | DataExport => 4.0,
            PlainLanguage => 3.0,
        }
    }

    pub fn internal_category(&self) -> InternalCategory {
        use ClauseType::*;
        match self {
            Arbitration | DelegationArbitrability | JuryTrialWaiver | ArbitrationCarveouts => {
                InternalCategory::DisputeResolution
            }
            ClassActionWaiver => InternalCategory::ClassActions,
            UnilateralChanges => InternalCategory::UnilateralChanges,
            DataSaleOrSharing
            | NoDataSale
            | VagueConsent
            | LimitedRetentionDisclosure
            | TransparentRetention => InternalCategory::DataPractices,
            AutoRenewalFriction | NegativeOptionBilling => InternalCategory::BillingAndAutorenewal,
            MoralRightsWaiver | OwnershipRetention => InternalCategory::ContentAndIp,
            LiabilityLimitation => InternalCategory::LiabilityAndRemedies,
            SelfServiceDeletion => InternalCategory::RetentionAndDeletion,
            ClearOptOut | PlainLanguage => InternalCategory::ConsentAndOptOut,
            DataExport | TerminationWithoutNotice => InternalCategory::AccountManagement,
            AlgorithmicProcessing => InternalCategory::AlgorithmicDecisions,
        }
    }

    fn pattern(&self) -> &'static str {
        use ClauseType::*;
        match self {
            Arbitration => r"(binding\s+)?arbitration|arbitral\s+tribunal",
            ClassActionWaiver => {
                r"class\s+action\s+waiver|waiver\s+of\s+class\s+action|waiv(?:e|er)\s+.*class\s+action"
            }
            UnilateralChanges => {
                r"(we\s+may\s+(modify|change|amend))|(we\s+reserve\s+the\s+right\s+to\s+(modify|change|amend))|((?:the\s+)?(?:company|corporation|service\s+provider|provider)\s+reserves?\s+(?:the\s+)?(?:unilateral\s+)?right\s+to\s+(modify|change|amend))"
            }
            DataSaleOrSharing => r"sell\s+your\s+data|share\s+your\s+personal\s+data",
            AutoRenewalFriction => r"auto-?renew(al)?|automatic\s+renewal",
            NegativeOptionBilling => r"negative\s+option",
            DelegationArbitrability => {
                r"exclusive\s+authority\s+to\s+determine\s+arbitrability|arbitrator\s+shall\s+decide\s+arbitrability"
            }
            ArbitrationCarveouts => r"arbitration\s+except\s+for|small\s+claims\s+court",
            VagueConsent => r"consent\s+.*(implied|deemed)",
            LimitedRetentionDisclosure => r"retain\s+your\s+data\s+for\s+(a|an)\s+period",
            MoralRightsWaiver => r"waive\s+(any|all)\s+moral\s+rights|moral\s+rights\s+waive",
            JuryTrialWaiver => {
                r"waive\s+(the\s+)?(right\s+to\s+)?(a\s+)?jury\s+trial|jury\s+trial\s+waiver"
            }
            LiabilityLimitation => {
                r"limitation\s+of\s+liability|limit(?:s|ed)?\s+(our\s+)?liabilit(y|ies)|no\s+liability\s+for"
            }
            AlgorithmicProcessing => r"automated\s+(decision|processing)|algorithmic|profiling",
            TerminationWithoutNotice => {
                r"terminate\s+.*without\s+(prior\s+)?notice|suspend\s+your\s+account\s+at\s+any\s+time"
            }
            ClearOptOut => r"opt-?out\s+(procedure|process)",
            SelfServiceDeletion => r"(delete|erase)\s+your\s+account|remove\s+your\s+data",
            NoDataSale => r"we\s+do\s+not\s+sell\s+(your\s+)?(personal\s+)?data",
            TransparentRetention => r"(retain|store)\s+data\s+for\s+\d+\s+(days|months|years)",
            PlainLanguage => r"plain\s+language|summary|in\s+plain\s+english|readable\s+summary",
            OwnershipRetention => r"you\s+retain\s+ownership\s+of\s+your\s+content",
            DataExport => r"(export|download)\s+your\s+data",
        }
    }
}

static CLAUSE_PATTERNS: Lazy<Vec<(ClauseType, Regex)>> = Lazy::new(|| {
    ClauseType::ALL
        .iter()
        .map(|c| {
            let re = Regex::new(&format!("(?i){}", c.pattern())).expect("clause regex");
            (*c, re)
        })
        .collect()
});

/// Document-type hint: a legal header at the start of a line.
static LEGAL_HEADERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\n)\s*(?:terms|privacy|policy|agreement|notice|disclaimer|conditions)")
        .expect("legal header regex")
});

pub fn has_legal_header(text: &str) -> bool {
    LEGAL_HEADERS.is_match(text)
}

/// Per-clause match counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseCounts(BTreeMap<ClauseType, usize>);

impl ClauseCounts {
    pub fn get(&self, clause: ClauseType) -> usize {
        self.0.get(&clause).copied().unwrap_or(0)
    }

    pub fn add(&mut self, clause: ClauseType, n: usize) {
        if n > 0 {
            *self.0.entry(clause).or_insert(0) += n;
        }
    }

    pub fn merge(&mut self, other: &ClauseCounts) {
        for (c, n) in other.iter() {
            self.add(c, n);
        }
    }

    /// Clauses with a non-zero count.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseType, usize)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Tier → clause → count, every clause present (zeros included).
    pub fn by_tier(&self) -> BTreeMap<RiskTier, BTreeMap<ClauseType, usize>> {
        let mut out: BTreeMap<RiskTier, BTreeMap<ClauseType, usize>> = BTreeMap::new();
        for c in ClauseType::ALL {
            out.entry(c.tier()).or_default().insert(c, self.get(c));
        }
        out
    }
}

/// Count non-overlapping matches of every clause detector in `text`.
pub fn count_clauses(text: &str) -> ClauseCounts {
    let mut counts = ClauseCounts::default();
    for (clause, re) in CLAUSE_PATTERNS.iter() {
        counts.add(*clause, re.find_iter(text).count());
    }
    counts
}
