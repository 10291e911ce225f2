//! Row decoding.

use registrar_core::store::StoreError;
use registrar_core::{
    Contact, Discount, Event, EventId, Money, PaymentId, PaymentProvider, Person, PersonId,
    PromoCode, PromoCodeId, Ticket, TicketId, TicketType, Venue, VenueId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

/// Columns selected for an event joined with its venue
pub(crate) const EVENT_COLUMNS: &str = r"
    e.id, e.name, e.region_webname, e.ticket_price_cents, e.early_bird_price_cents,
    e.early_bird_cutoff, e.registrations_open, e.registration_cutoff, e.min_age, e.max_age,
    e.majority_age, e.requires_promo_code,
    v.id AS venue_id, v.name AS venue_name, v.capacity AS venue_capacity
";

/// Ticket columns plus the linked guardian (prefixed `g_`)
pub(crate) const TICKET_COLUMNS: &str = r"
    t.id, t.event_id, t.first_name, t.last_name, t.age, t.email, t.phone, t.whatsapp,
    t.ticket_type, t.guardian_id, t.payment_id, t.promo_code_id, t.created_at,
    g.id AS g_id, g.first_name AS g_first_name, g.last_name AS g_last_name,
    g.email AS g_email, g.phone AS g_phone, g.whatsapp AS g_whatsapp
";

pub(crate) fn db(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{column}: {detail}"))
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| corrupt(column, e))
}

pub(crate) fn money(column: &str, cents: i64) -> Result<Money, StoreError> {
    u64::try_from(cents).map(Money::from_cents).map_err(|e| corrupt(column, e))
}

pub(crate) fn cents(money: Money) -> Result<i64, StoreError> {
    i64::try_from(money.cents()).map_err(|e| corrupt("amount", e))
}

fn small(column: &str, value: Option<i16>) -> Result<Option<u8>, StoreError> {
    value.map(|v| u8::try_from(v).map_err(|e| corrupt(column, e))).transpose()
}

fn count(column: &str, value: Option<i32>) -> Result<Option<u32>, StoreError> {
    value.map(|v| u32::try_from(v).map_err(|e| corrupt(column, e))).transpose()
}

pub(crate) fn event(row: &PgRow) -> Result<Event, StoreError> {
    let venue = match get::<Option<Uuid>>(row, "venue_id")? {
        Some(id) => Some(Venue {
            id: VenueId::from_uuid(id),
            name: get(row, "venue_name")?,
            capacity: count("venue_capacity", get(row, "venue_capacity")?)?,
        }),
        None => None,
    };

    Ok(Event {
        id: EventId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        region_webname: get(row, "region_webname")?,
        venue,
        ticket_price: money("ticket_price_cents", get(row, "ticket_price_cents")?)?,
        early_bird_price: get::<Option<i64>>(row, "early_bird_price_cents")?
            .map(|cents| money("early_bird_price_cents", cents))
            .transpose()?,
        early_bird_cutoff: get(row, "early_bird_cutoff")?,
        registrations_open: get(row, "registrations_open")?,
        registration_cutoff: get(row, "registration_cutoff")?,
        min_age: small("min_age", get(row, "min_age")?)?,
        max_age: small("max_age", get(row, "max_age")?)?,
        majority_age: small("majority_age", get(row, "majority_age")?)?,
        requires_promo_code: get(row, "requires_promo_code")?,
    })
}

pub(crate) fn promo_code(row: &PgRow) -> Result<PromoCode, StoreError> {
    let amount: i64 = get(row, "discount_amount")?;
    let discount_type: String = get(row, "discount_type")?;
    let discount = match discount_type.as_str() {
        "SUBTRACT" => Discount::Subtract(money("discount_amount", amount)?),
        "PERCENT" => Discount::Percent(u32::try_from(amount).map_err(|e| corrupt("discount_amount", e))?),
        other => return Err(corrupt("discount_type", other)),
    };

    Ok(PromoCode {
        id: PromoCodeId::from_uuid(get(row, "id")?),
        event_id: EventId::from_uuid(get(row, "event_id")?),
        code: get(row, "code")?,
        discount,
        uses: count("uses", get(row, "uses")?)?,
        metadata: get(row, "metadata")?,
    })
}

pub(crate) fn provider(value: &str) -> Result<PaymentProvider, StoreError> {
    value.parse().map_err(|e| corrupt("provider", e))
}

pub(crate) fn ticket(row: &PgRow) -> Result<Ticket, StoreError> {
    let ticket_type: String = get(row, "ticket_type")?;
    Ok(Ticket {
        id: TicketId::from_uuid(get(row, "id")?),
        event_id: EventId::from_uuid(get(row, "event_id")?),
        first_name: get(row, "first_name")?,
        last_name: get(row, "last_name")?,
        age: small("age", get(row, "age")?)?,
        contact: Contact {
            email: get(row, "email")?,
            phone: get(row, "phone")?,
            whatsapp: get(row, "whatsapp")?,
        },
        ticket_type: ticket_type
            .parse::<TicketType>()
            .map_err(|e| corrupt("ticket_type", e))?,
        guardian_id: get::<Option<Uuid>>(row, "guardian_id")?.map(PersonId::from_uuid),
        payment_id: get::<Option<Uuid>>(row, "payment_id")?.map(PaymentId::from_uuid),
        promo_code_id: get::<Option<Uuid>>(row, "promo_code_id")?.map(PromoCodeId::from_uuid),
        created_at: get(row, "created_at")?,
    })
}

pub(crate) fn guardian(row: &PgRow) -> Result<Option<Person>, StoreError> {
    let Some(id) = get::<Option<Uuid>>(row, "g_id")? else {
        return Ok(None);
    };
    Ok(Some(Person {
        id: PersonId::from_uuid(id),
        first_name: get(row, "g_first_name")?,
        last_name: get(row, "g_last_name")?,
        contact: Contact {
            email: get(row, "g_email")?,
            phone: get(row, "g_phone")?,
            whatsapp: get(row, "g_whatsapp")?,
        },
    }))
}
