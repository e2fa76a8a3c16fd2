/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// The three approvers allowed to sign in and to approve fund movements
pub const APPROVERS: [&str; 3] = ["Marshall Epie", "Aruna Ramineni", "Fitz Shrowder"];

pub fn is_approver(name: &str) -> bool {
    APPROVERS.contains(&name)
}

/// Which of the two independent record tables an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundKind {
    Incoming,
    Outgoing,
}

impl FundKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            FundKind::Incoming => "incoming_funds",
            FundKind::Outgoing => "outgoing_funds",
        }
    }

    pub fn from_table_name(table: &str) -> Option<Self> {
        match table {
            "incoming_funds" => Some(FundKind::Incoming),
            "outgoing_funds" => Some(FundKind::Outgoing),
            _ => None,
        }
    }
}

impl std::fmt::Display for FundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundKind::Incoming => write!(f, "incoming"),
            FundKind::Outgoing => write!(f, "outgoing"),
        }
    }
}

/// Where an incoming donation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    GoFundMe,
    Stripe,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    Check,
    Cash,
    Other,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::GoFundMe,
        Source::Stripe,
        Source::BankTransfer,
        Source::Check,
        Source::Cash,
        Source::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::GoFundMe => "GoFundMe",
            Source::Stripe => "Stripe",
            Source::BankTransfer => "Bank Transfer",
            Source::Check => "Check",
            Source::Cash => "Cash",
            Source::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Spending category of an outgoing payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Education,
    Operations,
    Marketing,
    Infrastructure,
    Salaries,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Education,
        Category::Operations,
        Category::Marketing,
        Category::Infrastructure,
        Category::Salaries,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "Education",
            Category::Operations => "Operations",
            Category::Marketing => "Marketing",
            Category::Infrastructure => "Infrastructure",
            Category::Salaries => "Salaries",
            Category::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// Destructive actions recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Delete => "DELETE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_round_trip_through_parse() {
        for source in Source::ALL {
            assert_eq!(Source::parse(source.as_str()), Some(source));
        }
        assert_eq!(Source::parse("Venmo"), None);
        assert_eq!(Source::parse("bank transfer"), None);
    }

    #[test]
    fn fund_kind_maps_to_tables() {
        assert_eq!(FundKind::Incoming.table_name(), "incoming_funds");
        assert_eq!(FundKind::from_table_name("outgoing_funds"), Some(FundKind::Outgoing));
        assert_eq!(FundKind::from_table_name("auth_sessions"), None);
    }
}
