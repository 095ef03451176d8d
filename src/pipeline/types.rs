//! Shared types for the triage pipeline.

use serde::Serialize;

// ── Classification ──────────────────────────────────────────────────

/// Business category of a classified email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 案件: an open engagement looking for engineers.
    JobPosting,
    /// 要員: an engineer looking for an engagement.
    CandidateProfile,
}

impl Category {
    /// Label used in prompts and model replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::JobPosting => "案件",
            Self::CandidateProfile => "要員",
        }
    }

    /// Short label for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::JobPosting => "job_posting",
            Self::CandidateProfile => "candidate_profile",
        }
    }
}

/// Classifier verdict for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Category(Category),
    /// 不明: neither category.
    Unknown,
}

impl Classification {
    pub const JOB_POSTING: Self = Self::Category(Category::JobPosting);
    pub const CANDIDATE_PROFILE: Self = Self::Category(Category::CandidateProfile);

    /// Map a model label onto the closed set. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "案件" => Self::JOB_POSTING,
            "要員" => Self::CANDIDATE_PROFILE,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Category(category) => category.label(),
            Self::Unknown => "不明",
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Self::Category(category) => Some(category),
            Self::Unknown => None,
        }
    }
}

// ── Remote policy ───────────────────────────────────────────────────

/// Four-step remote-work scale.
///
/// For candidates it is the stated preference; for job postings it is the
/// engagement's requirement. Only the on-site label differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemotePolicy {
    OnSite,
    MostlyRemote,
    PartiallyRemote,
    FullyRemote,
}

impl RemotePolicy {
    /// Parse a model label, accepting either category's on-site wording.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "常駐" | "常駐可能" | "on-site" | "on-site-available" => Some(Self::OnSite),
            "基本リモート" | "mostly-remote" => Some(Self::MostlyRemote),
            "一部リモート" | "partially-remote" => Some(Self::PartiallyRemote),
            "フルリモート" | "fully-remote" => Some(Self::FullyRemote),
            _ => None,
        }
    }

    /// Label published downstream for the given category.
    pub fn label(self, category: Category) -> &'static str {
        match (self, category) {
            (Self::OnSite, Category::JobPosting) => "常駐",
            (Self::OnSite, Category::CandidateProfile) => "常駐可能",
            (Self::MostlyRemote, _) => "基本リモート",
            (Self::PartiallyRemote, _) => "一部リモート",
            (Self::FullyRemote, _) => "フルリモート",
        }
    }
}

// ── Summary record ──────────────────────────────────────────────────

/// Structured fields extracted from one classified email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub category: Category,
    pub subject: String,
    /// Sender address.
    pub email: String,
    /// Recipient domain, `None` when the recipient has no `@`.
    pub domain: Option<String>,
    pub remote: Option<RemotePolicy>,
    pub date_and_time: String,
    pub location: String,
    pub start_time: String,
    /// Compensation in units of 10,000 yen.
    pub reward: Option<u16>,
    /// Candidate age, or the posting's age limit.
    pub age: String,
}

impl SummaryRecord {
    pub fn remote_label(&self) -> &'static str {
        self.remote
            .map(|remote| remote.label(self.category))
            .unwrap_or_default()
    }

    pub fn domain_or_empty(&self) -> &str {
        self.domain.as_deref().unwrap_or_default()
    }
}
