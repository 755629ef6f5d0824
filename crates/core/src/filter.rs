//! Filter criteria for the open-ticket query.
//!
//! The identifiers here are environment-specific (they differ between
//! database installations), so they are supplied by configuration and
//! bound as query parameters instead of being baked into the SQL text.

use crate::error::CoreError;
use crate::types::DbId;

/// Which shape of query (and therefore which card layout) a filter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryVariant {
    /// Ticket id, project, assignee, subject and creation date.
    Base,
    /// Base columns plus the support-type classification resolved through
    /// the given custom field.
    Extended { support_type_field_id: DbId },
}

impl QueryVariant {
    /// Whether rows and cards carry the support-type column.
    pub fn includes_support_type(&self) -> bool {
        matches!(self, Self::Extended { .. })
    }
}

/// Criteria selecting which tickets count as "pending for support".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    /// Ticket types to include.
    pub type_ids: Vec<DbId>,
    /// Project the tickets must belong to.
    pub project_id: DbId,
    /// Status that marks a ticket as no longer pending (e.g. closed).
    pub excluded_status_id: DbId,
    /// Custom field holding the support-type classification. Setting it
    /// switches the query to [`QueryVariant::Extended`].
    pub support_type_field_id: Option<DbId>,
}

impl TicketFilter {
    pub fn variant(&self) -> QueryVariant {
        match self.support_type_field_id {
            Some(support_type_field_id) => QueryVariant::Extended {
                support_type_field_id,
            },
            None => QueryVariant::Base,
        }
    }

    /// Reject filters that could never match anything meaningful.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.type_ids.is_empty() {
            return Err(CoreError::Validation(
                "at least one ticket type id is required".to_string(),
            ));
        }
        if let Some(bad) = self.type_ids.iter().find(|id| **id <= 0) {
            return Err(CoreError::Validation(format!(
                "ticket type id must be positive, got {bad}"
            )));
        }
        check_positive("project id", self.project_id)?;
        check_positive("excluded status id", self.excluded_status_id)?;
        if let Some(field_id) = self.support_type_field_id {
            check_positive("support type field id", field_id)?;
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: DbId) -> Result<(), CoreError> {
    if value <= 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}
