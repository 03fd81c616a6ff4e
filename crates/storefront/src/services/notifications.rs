//! Outbound email notifications.
//!
//! Covers the order lifecycle end to end: the operator hears about every
//! placed order, the customer gets a confirmation when a payment settles
//! and an update on each fulfillment step. Sending is fire-and-forget: a
//! lost email never fails or retries the flow that triggered it, it just
//! logs.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;

use winniecho_core::OrderStatus;

use crate::config::EmailConfig;

/// Facts about a settled order, flattened for mail rendering.
#[derive(Debug, Clone)]
pub struct OrderNotification {
    pub customer_name: String,
    pub customer_email: String,
    pub order_number: String,
    pub amount_paid: Decimal,
    pub points_earned: Decimal,
    pub payment_method: String,
}

/// A freshly placed, not-yet-paid order, for the operator alert.
#[derive(Debug, Clone)]
pub struct NewOrderNotification {
    pub customer_name: String,
    pub customer_email: String,
    pub order_number: String,
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// A fulfillment step taken on an order.
#[derive(Debug, Clone)]
pub struct StatusNotification {
    pub customer_name: String,
    pub customer_email: String,
    pub order_number: String,
    pub status: OrderStatus,
}

/// A password reset request, carrying the link to mail out.
#[derive(Debug, Clone)]
pub struct PasswordResetNotification {
    pub customer_name: String,
    pub customer_email: String,
    pub reset_url: String,
}

/// Email notifier. `Disabled` when SMTP is not configured, so local
/// development runs without a mail relay.
#[derive(Clone)]
pub enum Notifier {
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
        admin_address: String,
    },
    Disabled,
}

impl Notifier {
    /// Build a notifier from optional SMTP configuration.
    #[must_use]
    pub fn from_config(config: Option<&EmailConfig>) -> Self {
        let Some(config) = config else {
            tracing::info!("SMTP not configured, email notifications disabled");
            return Self::Disabled;
        };

        match build_mailer(config) {
            Ok(mailer) => Self::Smtp {
                mailer,
                from_address: config.from_address.clone(),
                admin_address: config.admin_address.clone(),
            },
            Err(error) => {
                tracing::error!(%error, "SMTP relay setup failed, email notifications disabled");
                Self::Disabled
            }
        }
    }

    /// Queue the post-payment emails (customer confirmation plus operator
    /// alert). Returns immediately; sends run on a background task.
    pub fn notify_order_paid(&self, notification: OrderNotification) {
        let Self::Smtp {
            mailer,
            from_address,
            admin_address,
        } = self
        else {
            return;
        };

        let mailer = mailer.clone();
        let from_address = from_address.clone();
        let admin_address = admin_address.clone();

        tokio::spawn(async move {
            let order_number = notification.order_number.clone();

            if let Err(error) = send_confirmation(&mailer, &from_address, &notification).await {
                tracing::warn!(%error, order_number, "order confirmation email failed");
            }
            if let Err(error) =
                send_admin_alert(&mailer, &from_address, &admin_address, &notification).await
            {
                tracing::warn!(%error, order_number, "admin payment email failed");
            }
        });
    }

    /// Alert the operator that an order was placed, before any payment.
    pub fn notify_admin_new_order(&self, notification: NewOrderNotification) {
        let Self::Smtp {
            mailer,
            from_address,
            admin_address,
        } = self
        else {
            return;
        };

        let mailer = mailer.clone();
        let from_address = from_address.clone();
        let admin_address = admin_address.clone();

        tokio::spawn(async move {
            if let Err(error) =
                send_new_order_alert(&mailer, &from_address, &admin_address, &notification).await
            {
                tracing::warn!(
                    %error,
                    order_number = notification.order_number,
                    "admin new-order email failed"
                );
            }
        });
    }

    /// Tell the customer their order moved through the fulfillment machine.
    /// Callers fire this only for the transition that actually won the
    /// conditional update, so a step is never announced twice.
    pub fn notify_status_changed(&self, notification: StatusNotification) {
        let Self::Smtp {
            mailer,
            from_address,
            ..
        } = self
        else {
            return;
        };

        let mailer = mailer.clone();
        let from_address = from_address.clone();

        tokio::spawn(async move {
            if let Err(error) = send_status_update(&mailer, &from_address, &notification).await {
                tracing::warn!(
                    %error,
                    order_number = notification.order_number,
                    "status update email failed"
                );
            }
        });
    }

    /// Mail a password reset link to the requesting account.
    pub fn notify_password_reset(&self, notification: PasswordResetNotification) {
        let Self::Smtp {
            mailer,
            from_address,
            ..
        } = self
        else {
            return;
        };

        let mailer = mailer.clone();
        let from_address = from_address.clone();

        tokio::spawn(async move {
            if let Err(error) = send_password_reset(&mailer, &from_address, &notification).await {
                tracing::warn!(%error, "password reset email failed");
            }
        });
    }
}

fn build_mailer(
    config: &EmailConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, SmtpError> {
    let credentials = Credentials::new(
        config.smtp_username.clone(),
        config.smtp_password.expose_secret().to_string(),
    );

    Ok(
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build(),
    )
}

async fn send_confirmation(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    notification: &OrderNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = format!(
        "Hi {name},\n\n\
         Thank you for your order!\n\n\
         Order number: {order}\n\
         Amount paid: RM {amount:.2} ({method})\n\
         Loyalty points earned: {points}\n\n\
         We'll let you know when your chocolates are on their way.\n\n\
         WinnieCho",
        name = notification.customer_name,
        order = notification.order_number,
        amount = notification.amount_paid,
        method = notification.payment_method,
        points = notification.points_earned,
    );

    let message = Message::builder()
        .from(from_address.parse()?)
        .to(notification.customer_email.parse()?)
        .subject(format!("Order {} confirmed", notification.order_number))
        .header(ContentType::TEXT_PLAIN)
        .body(body)?;

    mailer.send(message).await?;
    Ok(())
}

async fn send_admin_alert(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    admin_address: &str,
    notification: &OrderNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = format!(
        "Order {order} is paid\n\n\
         Customer: {name} <{email}>\n\
         Amount: RM {amount:.2} ({method})",
        order = notification.order_number,
        name = notification.customer_name,
        email = notification.customer_email,
        amount = notification.amount_paid,
        method = notification.payment_method,
    );

    let message = Message::builder()
        .from(from_address.parse()?)
        .to(admin_address.parse()?)
        .subject(format!("Order {} paid", notification.order_number))
        .header(ContentType::TEXT_PLAIN)
        .body(body)?;

    mailer.send(message).await?;
    Ok(())
}

async fn send_new_order_alert(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    admin_address: &str,
    notification: &NewOrderNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let message = Message::builder()
        .from(from_address.parse()?)
        .to(admin_address.parse()?)
        .subject(format!("New order {}", notification.order_number))
        .header(ContentType::TEXT_PLAIN)
        .body(new_order_body(notification))?;

    mailer.send(message).await?;
    Ok(())
}

fn new_order_body(notification: &NewOrderNotification) -> String {
    format!(
        "New order {order} placed, awaiting payment\n\n\
         Customer: {name} <{email}>\n\
         Subtotal: RM {subtotal:.2}\n\
         To charge: RM {total:.2}",
        order = notification.order_number,
        name = notification.customer_name,
        email = notification.customer_email,
        subtotal = notification.subtotal,
        total = notification.total,
    )
}

async fn send_status_update(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    notification: &StatusNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let message = Message::builder()
        .from(from_address.parse()?)
        .to(notification.customer_email.parse()?)
        .subject(format!(
            "Order {} {}",
            notification.order_number, notification.status
        ))
        .header(ContentType::TEXT_PLAIN)
        .body(status_update_body(notification))?;

    mailer.send(message).await?;
    Ok(())
}

fn status_update_body(notification: &StatusNotification) -> String {
    format!(
        "Hi {name},\n\n\
         An update on order {order}:\n\
         {message}\n\n\
         WinnieCho",
        name = notification.customer_name,
        order = notification.order_number,
        message = notification.status.customer_message(),
    )
}

async fn send_password_reset(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    notification: &PasswordResetNotification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let message = Message::builder()
        .from(from_address.parse()?)
        .to(notification.customer_email.parse()?)
        .subject("Reset your WinnieCho password")
        .header(ContentType::TEXT_PLAIN)
        .body(password_reset_body(notification))?;

    mailer.send(message).await?;
    Ok(())
}

fn password_reset_body(notification: &PasswordResetNotification) -> String {
    format!(
        "Hi {name},\n\n\
         Someone asked to reset the password for this account. If that was\n\
         you, open the link below within 30 minutes:\n\n\
         {url}\n\n\
         If you didn't request this, you can ignore this email and your\n\
         password will stay as it is.\n\n\
         WinnieCho",
        name = notification.customer_name,
        url = notification.reset_url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_carries_the_state_message() {
        let body = status_update_body(&StatusNotification {
            customer_name: "Aisyah".to_string(),
            customer_email: "aisyah@example.com".to_string(),
            order_number: "CHO202608231144053917".to_string(),
            status: OrderStatus::Shipped,
        });

        assert!(body.contains("CHO202608231144053917"));
        assert!(body.contains(OrderStatus::Shipped.customer_message()));
    }

    #[test]
    fn each_status_renders_a_distinct_update() {
        let bodies: Vec<String> = [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
        .into_iter()
        .map(|status| {
            status_update_body(&StatusNotification {
                customer_name: "Aisyah".to_string(),
                customer_email: "aisyah@example.com".to_string(),
                order_number: "CHO202608231144053917".to_string(),
                status,
            })
        })
        .collect();

        for (i, body) in bodies.iter().enumerate() {
            for other in &bodies[i + 1..] {
                assert_ne!(body, other);
            }
        }
    }

    #[test]
    fn reset_email_carries_the_link_and_expiry() {
        let body = password_reset_body(&PasswordResetNotification {
            customer_name: "Aisyah".to_string(),
            customer_email: "aisyah@example.com".to_string(),
            reset_url: "https://shop.example.com/reset-password?token=abc123".to_string(),
        });

        assert!(body.contains("https://shop.example.com/reset-password?token=abc123"));
        assert!(body.contains("30 minutes"));
        assert!(body.contains("ignore this email"));
    }

    #[test]
    fn new_order_alert_shows_both_amounts() {
        let body = new_order_body(&NewOrderNotification {
            customer_name: "Aisyah".to_string(),
            customer_email: "aisyah@example.com".to_string(),
            order_number: "CHO202608231144053917".to_string(),
            subtotal: Decimal::new(95_00, 2),
            total: Decimal::new(90_00, 2),
        });

        assert!(body.contains("RM 95.00"));
        assert!(body.contains("RM 90.00"));
        assert!(body.contains("awaiting payment"));
    }
}
