//! Post-commit notification dispatch.
//!
//! Tickets exist independently of their notifications: every delivery is attempted,
//! failures are logged and counted, and nothing is propagated to the caller.

use crate::metrics::NotificationMetrics;
use registrar_core::notify::{TicketNotice, TicketNotifier};

/// Outcome of dispatching notices for a batch of tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Deliveries that succeeded
    pub delivered: usize,
    /// Deliveries that failed
    pub failed: usize,
}

/// Sends the waiver reminder and ticket webhook for every notice.
pub async fn dispatch_ticket_notices(
    notifier: &dyn TicketNotifier,
    notices: &[TicketNotice],
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for notice in notices {
        match notifier.send_waiver_reminder(notice).await {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                report.failed += 1;
                NotificationMetrics::record_failure("waiver");
                tracing::warn!(
                    ticket_id = %notice.ticket.id,
                    event_id = %notice.event.id,
                    error = %error,
                    "Waiver reminder failed"
                );
            }
        }

        match notifier.send_ticket_webhook(notice).await {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                report.failed += 1;
                NotificationMetrics::record_failure("webhook");
                tracing::warn!(
                    ticket_id = %notice.ticket.id,
                    event_id = %notice.event.id,
                    error = %error,
                    "Ticket webhook failed"
                );
            }
        }
    }

    tracing::debug!(
        tickets = notices.len(),
        delivered = report.delivered,
        failed = report.failed,
        "Ticket notices dispatched"
    );
    report
}
