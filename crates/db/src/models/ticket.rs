//! Ticket rows as returned by the open-ticket query.

use chrono::NaiveDate;
use sqlx::FromRow;
use ticketcast_core::types::DbId;

/// One pending support ticket joined with its project and assignee.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TicketRecord {
    pub id: DbId,
    pub project_name: Option<String>,
    /// `"<first> <last>"` of the assignee, `None` when unassigned.
    pub assigned_to: Option<String>,
    pub subject: Option<String>,
    pub created_on: NaiveDate,
    /// Only selected by the extended query; absent columns decode as `None`.
    #[sqlx(default)]
    pub support_type: Option<String>,
}
