//! Stage definition store: where a session's stages come from.
//!
//! A catalog hands out fresh copies on every load, so a restart always
//! begins from clean `completed` flags.

use super::types::{
    ExpectedValues, FieldDefinition, FieldGroup, FieldKind, StageDefinition, ValidationRule,
};
use derive_more::{Display, Error};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Source of stage definitions.
pub trait StageCatalog: std::fmt::Debug + Send + Sync {
    /// Returns the ordered stages for a new session.
    fn load_stages(&self) -> Vec<StageDefinition>;
}

/// Catalog error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Catalog error: {} at {}:{}", message, file, line)]
pub struct CatalogError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CatalogError {
    /// Creates a new catalog error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Checks the structural rules every catalog must satisfy.
///
/// - at least one stage, numbered `1..=n` in order
/// - field ids unique within a stage
/// - expected values and display groups only name existing fields
/// - `select` fields carry a non-empty option list
#[instrument(skip(stages), fields(stages = stages.len()))]
pub fn validate_stages(stages: &[StageDefinition]) -> Result<(), CatalogError> {
    if stages.is_empty() {
        return Err(CatalogError::new("catalog defines no stages"));
    }

    for (stage, expected_number) in stages.iter().zip(1u32..) {
        let number = *stage.sequence_number();
        if number != expected_number {
            return Err(CatalogError::new(format!(
                "stage {} is out of sequence (expected {})",
                number, expected_number
            )));
        }

        let mut ids = BTreeSet::new();
        for field in stage.fields() {
            if !ids.insert(field.id().as_str()) {
                return Err(CatalogError::new(format!(
                    "stage {}: duplicate field id '{}'",
                    number,
                    field.id()
                )));
            }
            let has_options = field.options().as_ref().is_some_and(|o| !o.is_empty());
            if *field.kind() == FieldKind::Select && !has_options {
                return Err(CatalogError::new(format!(
                    "stage {}: select field '{}' has no options",
                    number,
                    field.id()
                )));
            }
        }

        if let Some(key) = stage.expected_values().keys().find(|k| !ids.contains(k.as_str())) {
            return Err(CatalogError::new(format!(
                "stage {}: expected value for unknown field '{}'",
                number, key
            )));
        }

        for group in stage.groups() {
            if let Some(id) = group.field_ids().iter().find(|id| !ids.contains(id.as_str())) {
                return Err(CatalogError::new(format!(
                    "stage {}: group '{}' names unknown field '{}'",
                    number,
                    group.name(),
                    id
                )));
            }
        }
        debug!(stage = number, fields = ids.len(), "Stage definition valid");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
//  TOML catalog
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CatalogFile {
    stages: Vec<StageDefinition>,
}

/// Stages read from a TOML file of `[[stages]]` tables.
#[derive(Debug, Clone)]
pub struct TomlCatalog {
    stages: Vec<StageDefinition>,
}

impl TomlCatalog {
    /// Parses and validates a catalog from TOML text.
    #[instrument(skip(content), fields(bytes = content.len()))]
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| CatalogError::new(format!("Failed to parse catalog: {}", e)))?;
        validate_stages(&file.stages)?;
        info!(stages = file.stages.len(), "Catalog loaded");
        Ok(Self { stages: file.stages })
    }

    /// Reads, parses, and validates a catalog file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            warn!(error = %e, "Catalog file unreadable");
            CatalogError::new(format!("Failed to read catalog file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }
}

impl StageCatalog for TomlCatalog {
    fn load_stages(&self) -> Vec<StageDefinition> {
        self.stages.clone()
    }
}

// ─────────────────────────────────────────────────────────────
//  Built-in catalog
// ─────────────────────────────────────────────────────────────

/// The three reference stages: contact entry, sales opportunity, and a
/// support case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl StageCatalog for BuiltinCatalog {
    fn load_stages(&self) -> Vec<StageDefinition> {
        vec![contact_stage(), opportunity_stage(), support_case_stage()]
    }
}

fn expected(pairs: &[(&str, &str)]) -> ExpectedValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn contact_stage() -> StageDefinition {
    let fields = vec![
        FieldDefinition::new("firstName", "First Name", FieldKind::Text, true)
            .with_placeholder("Enter first name"),
        FieldDefinition::new("lastName", "Last Name", FieldKind::Text, true)
            .with_placeholder("Enter last name"),
        FieldDefinition::new("email", "Email Address", FieldKind::Email, true)
            .with_placeholder("email@example.com")
            .with_rule(ValidationRule::Email),
        FieldDefinition::new("phone", "Phone Number", FieldKind::Text, true)
            .with_placeholder("(123) 456-7890"),
        FieldDefinition::new("company", "Company", FieldKind::Text, false)
            .with_placeholder("Enter company name"),
    ];
    let answers = expected(&[
        ("firstName", "Michael"),
        ("lastName", "Johnson"),
        ("email", "mjohnson@company.com"),
        ("phone", "(415) 555-3827"),
        ("company", "Acme Corporation"),
    ]);

    StageDefinition::new(1, fields, answers, 10, 5)
        .with_title(
            "Basic Contact Information",
            "Enter customer contact details in the CRM system",
        )
        .with_reference(
            "From: Sales Team\n\
             Subject: New Lead Information\n\
             \n\
             Just met with Michael Johnson from Acme Corporation during the trade show.\n\
             He can be reached at (415) 555-3827 or via email at mjohnson@company.com.\n\
             He expressed interest in our enterprise solution.",
        )
}

fn opportunity_stage() -> StageDefinition {
    let fields = vec![
        FieldDefinition::new("opportunityName", "Opportunity Name", FieldKind::Text, true)
            .with_placeholder("Enter opportunity name"),
        FieldDefinition::new("amount", "Deal Amount ($)", FieldKind::Number, true)
            .with_placeholder("Enter amount"),
        FieldDefinition::new("stage", "Sales Stage", FieldKind::Select, true).with_options([
            "Qualification",
            "Proposal",
            "Negotiation",
            "Closed Won",
            "Closed Lost",
        ]),
        FieldDefinition::new("probability", "Probability (%)", FieldKind::Number, true)
            .with_placeholder("Enter probability"),
        FieldDefinition::new("expectedCloseDate", "Expected Close Date", FieldKind::Date, true),
        FieldDefinition::new("description", "Description", FieldKind::MultilineText, false)
            .with_placeholder("Enter opportunity details"),
        FieldDefinition::new("source", "Lead Source", FieldKind::Select, true).with_options([
            "Website",
            "Referral",
            "Trade Show",
            "Cold Call",
            "Social Media",
        ]),
    ];
    let answers = expected(&[
        ("opportunityName", "Enterprise Software Upgrade"),
        ("amount", "75000"),
        ("stage", "Proposal"),
        ("probability", "60"),
        ("expectedCloseDate", "2023-12-31"),
        ("description", "Complete software upgrade for accounting department"),
        ("source", "Trade Show"),
    ]);

    StageDefinition::new(2, fields, answers, 15, 7)
        .with_title(
            "Sales Opportunity Details",
            "Record details about a new sales opportunity",
        )
        .with_reference(
            "Call Notes - December 5, 2023\n\
             Account Manager: Sarah Thompson\n\
             \n\
             Spoke with Acme Corp's IT Director about their accounting department software upgrade needs.\n\
             They're looking to spend around $75k for a complete Enterprise Software Upgrade.\n\
             We've sent the proposal last week, and they're currently reviewing it.\n\
             I'd estimate we have about a 60% chance of closing this deal.\n\
             They're hoping to implement by the end of the year (12/31/2023).\n\
             Remember this lead came from the Tech Expo Trade Show last month.\n\
             Additional notes: They specifically need the upgrade to handle their multi-currency \
             transactions and improve reporting capabilities for the accounting department.",
        )
        .with_groups(vec![
            FieldGroup::new(
                "Deal",
                ["opportunityName", "amount", "stage", "probability"],
            ),
            FieldGroup::new("Timeline", ["expectedCloseDate", "source"]),
            FieldGroup::new("Notes", ["description"]),
        ])
}

fn support_case_stage() -> StageDefinition {
    let fields = vec![
        FieldDefinition::new("caseNumber", "Case Number", FieldKind::Text, true)
            .with_placeholder("e.g., CS-12345"),
        FieldDefinition::new("customerID", "Customer ID", FieldKind::Text, true)
            .with_placeholder("Enter customer ID"),
        FieldDefinition::new("accountType", "Account Type", FieldKind::Select, true)
            .with_options(["Standard", "Premium", "Enterprise", "Partner"]),
        FieldDefinition::new("priority", "Priority", FieldKind::Select, true)
            .with_options(["Low", "Medium", "High", "Critical"]),
        FieldDefinition::new("category", "Category", FieldKind::Select, true).with_options([
            "Technical Issue",
            "Billing Question",
            "Feature Request",
            "Account Access",
            "Bug Report",
        ]),
        FieldDefinition::new("subCategory", "Sub-Category", FieldKind::Select, true).with_options([
            "Login Problem",
            "Data Sync",
            "Performance",
            "Integration",
            "Mobile App",
            "User Interface",
        ]),
        FieldDefinition::new("issueDescription", "Issue Description", FieldKind::MultilineText, true)
            .with_placeholder("Detailed description of the issue"),
        FieldDefinition::new("reproducible", "Is Issue Reproducible?", FieldKind::Checkbox, true),
        FieldDefinition::new("contactMethod", "Preferred Contact Method", FieldKind::Select, true)
            .with_options(["Email", "Phone", "Text", "In-app Message"]),
        FieldDefinition::new("assignedTo", "Assign To Department", FieldKind::Select, true)
            .with_options([
                "Tier 1 Support",
                "Tier 2 Support",
                "Engineering",
                "Account Management",
                "Billing",
            ]),
    ];
    let answers = expected(&[
        ("caseNumber", "CS-78294"),
        ("customerID", "CUST-55872"),
        ("accountType", "Enterprise"),
        ("priority", "High"),
        ("category", "Technical Issue"),
        ("subCategory", "Data Sync"),
        (
            "issueDescription",
            "Customer cannot sync data between mobile and desktop applications. \
             Error occurs after recent update.",
        ),
        ("reproducible", "true"),
        ("contactMethod", "Email"),
        ("assignedTo", "Tier 2 Support"),
    ]);

    StageDefinition::new(3, fields, answers, 20, 10)
        .with_title(
            "Customer Service Case Management",
            "Process a customer support ticket with advanced details",
        )
        .with_reference(
            "Support Ticket\n\
             Received: 10:45 AM, May 15, 2024\n\
             Support Agent: Alex Rivera\n\
             \n\
             Logged case CS-78294 for Enterprise customer (ID: CUST-55872).\n\
             The customer called reporting a High priority Technical Issue with Data Sync functionality.\n\
             The problem started after our latest update (v3.2.1).\n\
             Customer reports they cannot sync data between their mobile app and desktop application.\n\
             They sent screenshots by Email showing the error messages.\n\
             I was able to reproduce the issue in our test environment.\n\
             This seems to require Tier 2 Support investigation as it involves both the API and \
             client applications.\n\
             \n\
             Customer comments: \"Every time I try to sync between my phone and laptop, I get an \
             error message saying 'Sync Failed: Unexpected data format'. This started right after \
             I installed the update yesterday.\"",
        )
        .with_groups(vec![
            FieldGroup::new("Case", ["caseNumber", "customerID", "accountType"]),
            FieldGroup::new(
                "Classification",
                ["priority", "category", "subCategory", "reproducible"],
            ),
            FieldGroup::new(
                "Routing",
                ["issueDescription", "contactMethod", "assignedTo"],
            ),
        ])
}
