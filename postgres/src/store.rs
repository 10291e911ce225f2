//! `PostgreSQL` implementation of [`RegistrationStore`].

use crate::rows::{self, EVENT_COLUMNS, TICKET_COLUMNS, db};
use async_trait::async_trait;
use registrar_core::admission::admit;
use registrar_core::store::{
    HeldTicket, IssueError, Issuance, IssuedRegistration, RegistrationStore, StoreError,
};
use registrar_core::{
    EventId, PaymentId, PaymentProvider, Person, PersonId, RedeemablePromo, Ticket, TicketId,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

/// Registration store over a `PostgreSQL` pool.
///
/// [`RegistrationStore::issue`] runs in one transaction that locks the event row with
/// `SELECT ... FOR UPDATE`, so concurrent issuances for the same event are serialized
/// and capacity is re-checked against committed tickets.
///
/// # Example
///
/// ```no_run
/// use registrar_postgres::PostgresRegistrationStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresRegistrationStore::connect("postgres://localhost/registrar").await?;
/// registrar_postgres::migrate(store.pool()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresRegistrationStore {
    pool: PgPool,
}

impl PostgresRegistrationStore {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(db)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn issue_in(
        tx: &mut Transaction<'_, Postgres>,
        issuance: Issuance,
    ) -> Result<IssuedRegistration, IssueError> {
        // Lock the event row; concurrent issuances for this event queue up here
        let event_row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e LEFT JOIN venues v ON v.id = e.venue_id \
             WHERE e.id = $1 FOR UPDATE OF e"
        ))
        .bind(*issuance.event_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db)?
        .ok_or(IssueError::EventNotFound(issuance.event_id))?;
        let event = rows::event(&event_row)?;

        let requested = issuance.requested();
        let sold = count_tickets_in(tx, event.id).await?;
        admit(&event, sold, requested)?;

        if let Some(promo) = &issuance.promo {
            let locked: Option<(Option<i32>,)> =
                sqlx::query_as("SELECT uses FROM promo_codes WHERE id = $1 FOR UPDATE")
                    .bind(*promo.id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(db)?;
            let Some((uses,)) = locked else {
                return Err(IssueError::PromoExhausted { code: promo.code.clone() });
            };

            if let Some(max) = uses {
                let (redemptions,): (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE promo_code_id = $1")
                        .bind(*promo.id.as_uuid())
                        .fetch_one(&mut **tx)
                        .await
                        .map_err(db)?;
                if i64::from(max) - redemptions < i64::from(requested) {
                    return Err(IssueError::PromoExhausted { code: promo.code.clone() });
                }
            }
        }

        let payment_id = match issuance.payment {
            Some(payment) => {
                let id = PaymentId::new();
                sqlx::query(
                    r"
                    INSERT INTO payments (id, provider, intent_id, amount_cents, complete, created_at)
                    VALUES ($1, $2, $3, $4, FALSE, $5)
                    ",
                )
                .bind(*id.as_uuid())
                .bind(payment.provider.as_str())
                .bind(&payment.intent_id)
                .bind(rows::cents(payment.amount)?)
                .bind(issuance.created_at)
                .execute(&mut **tx)
                .await
                .map_err(db)?;
                Some(id)
            }
            None => None,
        };

        let guardian = match issuance.guardian {
            Some(input) => {
                let person = Person {
                    id: PersonId::new(),
                    first_name: input.first_name,
                    last_name: input.last_name,
                    contact: input.contact,
                };
                sqlx::query(
                    r"
                    INSERT INTO people (id, first_name, last_name, email, phone, whatsapp, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ",
                )
                .bind(*person.id.as_uuid())
                .bind(&person.first_name)
                .bind(&person.last_name)
                .bind(&person.contact.email)
                .bind(&person.contact.phone)
                .bind(&person.contact.whatsapp)
                .bind(issuance.created_at)
                .execute(&mut **tx)
                .await
                .map_err(db)?;
                Some(person)
            }
            None => None,
        };

        let promo_code_id = issuance.promo.as_ref().map(|p| p.id);
        let mut tickets = Vec::with_capacity(issuance.tickets.len());
        for pending in issuance.tickets {
            let ticket = Ticket {
                id: TicketId::new(),
                event_id: event.id,
                first_name: pending.input.first_name,
                last_name: pending.input.last_name,
                age: pending.input.age,
                contact: pending.input.contact,
                ticket_type: pending.input.ticket_type,
                guardian_id: guardian.as_ref().filter(|_| pending.needs_guardian).map(|g| g.id),
                payment_id,
                promo_code_id,
                created_at: issuance.created_at,
            };

            sqlx::query(
                r"
                INSERT INTO tickets (
                    id, event_id, first_name, last_name, age, email, phone, whatsapp,
                    ticket_type, guardian_id, payment_id, promo_code_id, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ",
            )
            .bind(*ticket.id.as_uuid())
            .bind(*ticket.event_id.as_uuid())
            .bind(&ticket.first_name)
            .bind(&ticket.last_name)
            .bind(ticket.age.map(i16::from))
            .bind(&ticket.contact.email)
            .bind(&ticket.contact.phone)
            .bind(&ticket.contact.whatsapp)
            .bind(ticket.ticket_type.as_str())
            .bind(ticket.guardian_id.map(|id| *id.as_uuid()))
            .bind(ticket.payment_id.map(|id| *id.as_uuid()))
            .bind(ticket.promo_code_id.map(|id| *id.as_uuid()))
            .bind(ticket.created_at)
            .execute(&mut **tx)
            .await
            .map_err(db)?;

            tickets.push(ticket);
        }

        Ok(IssuedRegistration { payment_id, guardian, tickets })
    }
}

async fn count_tickets_in(
    tx: &mut Transaction<'_, Postgres>,
    event_id: EventId,
) -> Result<u32, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
        .bind(*event_id.as_uuid())
        .fetch_one(&mut **tx)
        .await
        .map_err(db)?;
    u32::try_from(count).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl RegistrationStore for PostgresRegistrationStore {
    async fn load_event(&self, event_id: EventId) -> Result<Option<registrar_core::Event>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e LEFT JOIN venues v ON v.id = e.venue_id WHERE e.id = $1"
        ))
        .bind(*event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(rows::event).transpose()
    }

    async fn count_tickets(&self, event_id: EventId) -> Result<u32, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
            .bind(*event_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        u32::try_from(count).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn find_promo_codes(
        &self,
        event_id: EventId,
        normalized_code: &str,
    ) -> Result<Vec<RedeemablePromo>, StoreError> {
        let records = sqlx::query(
            r"
            SELECT p.id, p.event_id, p.code, p.discount_type, p.discount_amount, p.uses, p.metadata,
                   (SELECT COUNT(*) FROM tickets t WHERE t.promo_code_id = p.id) AS redemptions
            FROM promo_codes p
            WHERE p.event_id = $1 AND lower(btrim(p.code)) = $2
            ORDER BY p.created_at, p.id
            ",
        )
        .bind(*event_id.as_uuid())
        .bind(normalized_code)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        records
            .iter()
            .map(|row| {
                let redemptions: i64 = row.try_get("redemptions").map_err(db)?;
                Ok(RedeemablePromo {
                    code: rows::promo_code(row)?,
                    redemptions: u32::try_from(redemptions).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }

    async fn issue(&self, issuance: Issuance) -> Result<IssuedRegistration, IssueError> {
        let event_id = issuance.event_id;
        let mut tx = self.pool.begin().await.map_err(db)?;

        match Self::issue_in(&mut tx, issuance).await {
            Ok(issued) => {
                tx.commit().await.map_err(db)?;
                metrics::counter!("registrar_store_issuances_total", "outcome" => "committed")
                    .increment(1);
                Ok(issued)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(event_id = %event_id, error = %rollback, "Issuance rollback failed");
                }
                metrics::counter!("registrar_store_issuances_total", "outcome" => "rolled_back")
                    .increment(1);
                Err(error)
            }
        }
    }

    async fn complete_payment(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET complete = TRUE WHERE provider = $1 AND intent_id = $2",
        )
        .bind(provider.as_str())
        .bind(intent_id)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<HeldTicket>, StoreError> {
        let records = sqlx::query(&format!(
            r"
            SELECT {TICKET_COLUMNS}
            FROM tickets t
            JOIN payments p ON p.id = t.payment_id
            LEFT JOIN people g ON g.id = t.guardian_id
            WHERE p.provider = $1 AND p.intent_id = $2
            ORDER BY t.seq
            "
        ))
        .bind(provider.as_str())
        .bind(intent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        records
            .iter()
            .map(|row| Ok(HeldTicket { ticket: rows::ticket(row)?, guardian: rows::guardian(row)? }))
            .collect()
    }

    async fn delete_tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<TicketId>, StoreError> {
        let deleted: Vec<(uuid::Uuid,)> = sqlx::query_as(
            r"
            DELETE FROM tickets t
            USING payments p
            WHERE p.id = t.payment_id AND p.provider = $1 AND p.intent_id = $2
            RETURNING t.id
            ",
        )
        .bind(provider.as_str())
        .bind(intent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        Ok(deleted.into_iter().map(|(id,)| TicketId::from_uuid(id)).collect())
    }
}
