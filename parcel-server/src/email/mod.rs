//! Reservation confirmation email
//!
//! Plain-text only. Sent through the Mailjet v3.1 Send API when keys are
//! configured; otherwise the message is written to the log.

mod mailjet;

use std::sync::Arc;

use shared::error::AppError;
use shared::models::{ParcelType, Reservation, parcel_by_id};
use shared::util::{format_date_de, format_euro};
use tokio::sync::Mutex;

use crate::config::{BankDetails, Config, MailConfig};

pub use mailjet::MailjetClient;

/// A rendered message ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub text: String,
}

/// Mail transport
#[derive(Clone)]
pub enum Mailer {
    Mailjet(MailjetClient),
    /// No credentials: log the message instead of sending it
    Log,
    /// Keep messages in memory (tests)
    Outbox(Arc<Mutex<Vec<OutgoingEmail>>>),
}

impl Mailer {
    pub fn from_config(mail: &MailConfig) -> Self {
        match (&mail.mailjet_api_key, &mail.mailjet_secret_key) {
            (Some(key), Some(secret)) => Self::Mailjet(MailjetClient::new(
                key.clone(),
                secret.clone(),
                mail.from_email.clone(),
                mail.from_name.clone(),
            )),
            _ => {
                tracing::warn!("Mailjet credentials not set, confirmation emails will be logged");
                Self::Log
            }
        }
    }

    pub fn outbox() -> Self {
        Self::Outbox(Arc::new(Mutex::new(Vec::new())))
    }

    /// Messages captured by an [`Mailer::Outbox`] transport
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        match self {
            Self::Outbox(outbox) => outbox.lock().await.clone(),
            _ => Vec::new(),
        }
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        match self {
            Self::Mailjet(client) => client.send(email).await,
            Self::Log => {
                tracing::info!(
                    to = %email.to_email,
                    subject = %email.subject,
                    "Email transport not configured, logging message\n{}",
                    email.text
                );
                Ok(())
            }
            Self::Outbox(outbox) => {
                outbox.lock().await.push(email.clone());
                Ok(())
            }
        }
    }
}

/// Text content that depends on deployment, not on the reservation
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub bank: BankDetails,
    pub club_name: String,
    pub contact_email: String,
}

impl EmailSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bank: config.bank.clone(),
            club_name: config.club_name.clone(),
            contact_email: config.club_contact_email.clone(),
        }
    }
}

/// One line of the parcel summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelGroup {
    pub parcel_type: ParcelType,
    pub count: u32,
    pub total_cents: i64,
}

/// Group parcels by type, in order of first appearance
pub fn group_parcels_by_type<S: AsRef<str>>(parcel_ids: &[S]) -> Vec<ParcelGroup> {
    let mut groups: Vec<ParcelGroup> = Vec::new();
    for parcel in parcel_ids.iter().filter_map(|id| parcel_by_id(id.as_ref())) {
        match groups.iter_mut().find(|g| g.parcel_type == parcel.parcel_type) {
            Some(group) => {
                group.count += 1;
                group.total_cents += parcel.price_cents;
            }
            None => groups.push(ParcelGroup {
                parcel_type: parcel.parcel_type,
                count: 1,
                total_cents: parcel.price_cents,
            }),
        }
    }
    groups
}

pub fn confirmation_subject(reservation_id: &str) -> String {
    format!("Reservierungsbestätigung - Kunstrasen Aktion ({reservation_id})")
}

/// Transfer reference the buyer must quote, e.g. `Kunstrasen RES-K3XQ7F2A`
pub fn payment_reference(bank: &BankDetails, reservation_id: &str) -> String {
    format!("{} {}", bank.reference_prefix, reservation_id)
}

pub fn render_confirmation_text(reservation: &Reservation, settings: &EmailSettings) -> String {
    let parcel_list = group_parcels_by_type(&reservation.parcels)
        .iter()
        .map(|g| {
            format!(
                "- {}x {}: {}",
                g.count,
                g.parcel_type.label(),
                format_euro(g.total_cents)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let total = format_euro(reservation.total_cents);
    let bank = &settings.bank;

    format!(
        "\
{club} - Reservierungsbestätigung
========================================

Vielen Dank für Ihre Reservierung!

Liebe/r {name},

vielen Dank für Ihre Unterstützung des {club}!

RESERVIERUNGSDETAILS
--------------------
Reservierungsnummer: {id}
Datum: {created}

IHRE PARZELLEN
--------------
{parcel_list}

Gesamtbetrag: {total}

ZAHLUNGSINFORMATIONEN
---------------------
Empfänger: {recipient}
IBAN: {iban}
BIC: {bic}
Verwendungszweck: {reference}
Betrag: {total}

WICHTIG: Bitte überweisen Sie den Betrag bis zum {deadline}.
Danach werden nicht bezahlte Parzellen wieder freigegeben.
Nach Zahlungseingang werden Ihre Parzellen als verkauft markiert.

Bei Fragen: {contact}

{club}",
        club = settings.club_name,
        name = reservation.buyer_name,
        id = reservation.id,
        created = format_date_de(reservation.created_at),
        recipient = bank.recipient,
        iban = bank.iban,
        bic = bank.bic,
        reference = payment_reference(bank, &reservation.id),
        deadline = format_date_de(reservation.expires_at),
        contact = settings.contact_email,
    )
}

pub fn reservation_confirmation(
    reservation: &Reservation,
    settings: &EmailSettings,
) -> OutgoingEmail {
    OutgoingEmail {
        to_email: reservation.buyer_email.clone(),
        to_name: reservation.buyer_name.clone(),
        subject: confirmation_subject(&reservation.id),
        text: render_confirmation_text(reservation, settings),
    }
}

/// Render and send the confirmation. Returns whether the message went out;
/// failures are logged and never surface to the buyer.
pub async fn send_reservation_confirmation(
    mailer: &Mailer,
    settings: &EmailSettings,
    reservation: &Reservation,
) -> bool {
    let email = reservation_confirmation(reservation, settings);
    match mailer.send(&email).await {
        Ok(()) => {
            tracing::info!(reservation_id = %reservation.id, "Confirmation email sent");
            true
        }
        Err(e) => {
            tracing::error!(
                reservation_id = %reservation.id,
                code = %e.code,
                error = %e,
                "Failed to send confirmation email"
            );
            false
        }
    }
}
