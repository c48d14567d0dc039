//! Book exchange marketplace backend.
//!
//! Hexagonal layout: `domain` holds entities, the exchange ledger and the
//! services behind the driving ports; `inbound` translates HTTP into port
//! calls; `outbound` implements the driven ports (PostgreSQL, in-memory,
//! filesystem, chat completions).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
