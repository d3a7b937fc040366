// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Payment notification receiver.
//!
//! Takes the raw body (signature verification needs the exact bytes), then
//! parse, dispatch, reconcile. Response codes follow the notifier's retry
//! contract: 200 acknowledges (including graceful no-ops), 500 asks for
//! redelivery, and the idempotency ledger keeps redelivery safe.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::context::AppContext;
use crate::error::ServiceError;
use crate::notifications::{
    classify, parse_notification, verify_signature, Disposition, SIGNATURE_HEADER,
};
use crate::reconcile::{reconcile_completed_payment, ReconcileOutcome};

pub async fn receive_notification(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Notification missing signature header");
            ServiceError::InvalidSignature
        })?;

    if !verify_signature(&ctx.config.webhook.secret, &body, signature) {
        warn!("Notification signature verification failed");
        return Err(ServiceError::InvalidSignature);
    }

    let envelope = match parse_notification(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            // Retryable: the notifier may redeliver an intact copy.
            warn!("Unparseable notification payload: {:#}", e);
            return Ok(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!(event_type = %envelope.event_type, "Received payment notification");

    let status = match classify(&envelope.event_type) {
        Disposition::Reconcile => {
            let Some(payment) = envelope.completed_payment() else {
                // Acknowledged no-op: a malformed notification will never
                // become processable, so retrying would loop forever.
                warn!(
                    event_type = %envelope.event_type,
                    "Notification missing identifying fields, skipping"
                );
                return Ok(StatusCode::OK);
            };

            let mut conn = match ctx.db.get_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to get database connection: {}", e);
                    return Ok(StatusCode::INTERNAL_SERVER_ERROR);
                }
            };

            match reconcile_completed_payment(
                &mut conn,
                &ctx.config.commission,
                &payment,
                Utc::now(),
            )
            .await
            {
                Ok(ReconcileOutcome::Applied { commission }) => {
                    info!(
                        order_id = %payment.order_id,
                        commission = ?commission,
                        "Payment reconciled"
                    );
                    StatusCode::OK
                }
                Ok(ReconcileOutcome::DuplicateOrder) | Ok(ReconcileOutcome::UserNotFound) => {
                    StatusCode::OK
                }
                Err(e) => {
                    error!(order_id = %payment.order_id, "Reconciliation failed: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
        Disposition::LogDenied => {
            warn!(event_type = %envelope.event_type, "Payment capture denied");
            StatusCode::OK
        }
        Disposition::LogSubscriptionEnded => {
            info!(event_type = %envelope.event_type, "Subscription ended upstream");
            StatusCode::OK
        }
        Disposition::Ignore => {
            debug!(event_type = %envelope.event_type, "Ignoring unrecognized event type");
            StatusCode::OK
        }
    };

    Ok(status)
}
