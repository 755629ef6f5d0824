//! Adaptive Card message for a single pending ticket.
//!
//! The card is wrapped in the `message` envelope accepted by Teams incoming
//! webhooks. Its fact list has a fixed shape per query variant: a missing
//! ticket field renders as an empty value, it is never dropped.

use serde::Serialize;
use ticketcast_core::filter::QueryVariant;
use ticketcast_db::models::ticket::TicketRecord;

/// Heading and summary of every ticket card.
pub const CARD_TITLE: &str = "Tickets Pending for Customer Support";

const MESSAGE_TYPE: &str = "message";
const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const ADAPTIVE_CARD_VERSION: &str = "1.5";

pub const FACT_TICKET_NO: &str = "Ticket No:";
pub const FACT_PROJECT: &str = "Project:";
pub const FACT_ASSIGNEE: &str = "Assignee:";
pub const FACT_SUBJECT: &str = "Subject:";
pub const FACT_CREATED_DATE: &str = "Created Date:";
pub const FACT_SUPPORT_TYPE: &str = "Support Type:";

/// Top-level webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationCard {
    #[serde(rename = "type")]
    kind: &'static str,
    summary: String,
    attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Attachment {
    content_type: &'static str,
    content: AdaptiveCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AdaptiveCard {
    #[serde(rename = "$schema")]
    schema: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'static str,
    body: Vec<CardElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
enum CardElement {
    TextBlock {
        text: String,
        size: &'static str,
        weight: &'static str,
        wrap: bool,
    },
    FactSet {
        facts: Vec<Fact>,
    },
}

/// One label/value row of the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub title: String,
    pub value: String,
}

impl Fact {
    fn new(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
        }
    }
}

impl NotificationCard {
    /// Render `ticket` as a card. The support-type fact is present exactly
    /// when `variant` is [`QueryVariant::Extended`].
    pub fn for_ticket(ticket: &TicketRecord, variant: &QueryVariant) -> Self {
        let mut facts = vec![
            Fact::new(FACT_TICKET_NO, ticket.id.to_string()),
            Fact::new(FACT_PROJECT, display(ticket.project_name.as_deref())),
            Fact::new(FACT_ASSIGNEE, display(ticket.assigned_to.as_deref())),
            Fact::new(FACT_SUBJECT, display(ticket.subject.as_deref())),
            Fact::new(FACT_CREATED_DATE, ticket.created_on.to_string()),
        ];
        if variant.includes_support_type() {
            facts.push(Fact::new(
                FACT_SUPPORT_TYPE,
                display(ticket.support_type.as_deref()),
            ));
        }

        Self {
            kind: MESSAGE_TYPE,
            summary: CARD_TITLE.to_string(),
            attachments: vec![Attachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE,
                content: AdaptiveCard {
                    schema: ADAPTIVE_CARD_SCHEMA,
                    kind: "AdaptiveCard",
                    version: ADAPTIVE_CARD_VERSION,
                    body: vec![
                        CardElement::TextBlock {
                            text: CARD_TITLE.to_string(),
                            size: "Large",
                            weight: "Bolder",
                            wrap: true,
                        },
                        CardElement::FactSet { facts },
                    ],
                },
            }],
        }
    }

    /// The card's fact rows, in display order.
    pub fn facts(&self) -> &[Fact] {
        self.attachments
            .iter()
            .flat_map(|a| a.content.body.iter())
            .find_map(|element| match element {
                CardElement::FactSet { facts } => Some(facts.as_slice()),
                CardElement::TextBlock { .. } => None,
            })
            .unwrap_or(&[])
    }

    /// Value of the fact titled `title`, if the card has one.
    pub fn fact(&self, title: &str) -> Option<&str> {
        self.facts()
            .iter()
            .find(|f| f.title == title)
            .map(|f| f.value.as_str())
    }
}

fn display(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}
