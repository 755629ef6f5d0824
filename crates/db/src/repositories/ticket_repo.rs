//! Repository for pending support tickets in the `work_packages` table.

use sqlx::PgConnection;
use ticketcast_core::filter::{QueryVariant, TicketFilter};

use crate::models::ticket::TicketRecord;

/// Columns shared by both query variants.
const BASE_COLUMNS: &str = "wp.id::bigint AS id, \
     p.name AS project_name, \
     CASE WHEN u.id IS NULL THEN NULL \
          ELSE concat(u.firstname, ' ', u.lastname) END AS assigned_to, \
     wp.subject, \
     wp.created_at::date AS created_on";

/// Joins shared by both query variants.
const BASE_JOINS: &str = "LEFT JOIN projects p ON p.id = wp.project_id \
     LEFT JOIN users u ON u.id = wp.assigned_to_id";

/// Resolves the support-type option for a ticket. `LIMIT 1` keeps one row
/// per ticket even if the field holds several values.
const SUPPORT_TYPE_JOIN: &str = "LEFT JOIN LATERAL ( \
         SELECT co.value \
         FROM custom_values cv \
         JOIN custom_options co ON co.id::text = cv.value \
         WHERE cv.customized_type = 'WorkPackage' \
           AND cv.customized_id = wp.id \
           AND cv.custom_field_id = $4 \
         ORDER BY cv.id \
         LIMIT 1 \
     ) st ON true";

/// Filter predicates: `$1` type ids, `$2` project id, `$3` excluded status.
const FILTER: &str = "wp.type_id = ANY($1) \
     AND wp.project_id = $2 \
     AND wp.status_id <> $3";

/// Reads pending tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// SQL text for the given variant. Filter values are bound separately
    /// by [`TicketRepo::list_open`].
    pub fn query_sql(variant: &QueryVariant) -> String {
        match variant {
            QueryVariant::Base => format!(
                "SELECT {BASE_COLUMNS} \
                 FROM work_packages wp \
                 {BASE_JOINS} \
                 WHERE {FILTER} \
                 ORDER BY wp.id"
            ),
            QueryVariant::Extended { .. } => format!(
                "SELECT {BASE_COLUMNS}, st.value AS support_type \
                 FROM work_packages wp \
                 {BASE_JOINS} \
                 {SUPPORT_TYPE_JOIN} \
                 WHERE {FILTER} \
                 ORDER BY wp.id"
            ),
        }
    }

    /// List tickets matching `filter`, ordered by ticket id.
    pub async fn list_open(
        conn: &mut PgConnection,
        filter: &TicketFilter,
    ) -> Result<Vec<TicketRecord>, sqlx::Error> {
        let variant = filter.variant();
        let sql = Self::query_sql(&variant);

        let mut query = sqlx::query_as::<_, TicketRecord>(&sql)
            .bind(&filter.type_ids)
            .bind(filter.project_id)
            .bind(filter.excluded_status_id);
        if let QueryVariant::Extended {
            support_type_field_id,
        } = variant
        {
            query = query.bind(support_type_field_id);
        }

        let tickets = query.fetch_all(&mut *conn).await?;
        tracing::debug!(count = tickets.len(), ?variant, "Fetched open tickets");
        Ok(tickets)
    }
}
