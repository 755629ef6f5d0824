/// Ticket, project, type and status identifiers are PostgreSQL integers,
/// widened to `BIGINT` on the way out of the query.
pub type DbId = i64;
