// src/db/supportdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::supportmodel::*;
use crate::service::error::ServiceError;
use crate::service::transitions;

#[async_trait]
pub trait SupportExt {
    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        category: TicketCategory,
        priority: TicketPriority,
    ) -> Result<SupportTicket, ServiceError>;

    async fn get_support_tickets(
        &self,
        limit: i64,
        offset: i64,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, ServiceError>;

    async fn get_user_support_tickets(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, ServiceError>;

    async fn get_support_ticket(&self, ticket_id: Uuid) -> Result<Option<SupportTicket>, ServiceError>;

    async fn get_support_ticket_with_messages(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<SupportTicketWithMessages>, ServiceError>;

    /// Appends a message; refused once the ticket is closed.
    async fn add_ticket_message(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        message: String,
        is_staff_reply: bool,
    ) -> Result<SupportMessage, ServiceError>;

    async fn get_ticket_messages(&self, ticket_id: Uuid) -> Result<Vec<SupportMessage>, ServiceError>;

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, ServiceError>;
}

#[async_trait]
impl SupportExt for DBClient {
    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        category: TicketCategory,
        priority: TicketPriority,
    ) -> Result<SupportTicket, ServiceError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (user_id, title, description, category, priority, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(priority)
        .bind(TicketStatus::Open)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_support_tickets(
        &self,
        limit: i64,
        offset: i64,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, ServiceError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT * FROM support_tickets
            WHERE ($1::ticket_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn get_user_support_tickets(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, ServiceError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT * FROM support_tickets
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn get_support_ticket(&self, ticket_id: Uuid) -> Result<Option<SupportTicket>, ServiceError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT * FROM support_tickets
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_support_ticket_with_messages(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<SupportTicketWithMessages>, ServiceError> {
        let ticket = self.get_support_ticket(ticket_id).await?;

        if let Some(ticket) = ticket {
            let messages = self.get_ticket_messages(ticket_id).await?;
            Ok(Some(SupportTicketWithMessages { ticket, messages }))
        } else {
            Ok(None)
        }
    }

    async fn add_ticket_message(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        message: String,
        is_staff_reply: bool,
    ) -> Result<SupportMessage, ServiceError> {
        // Check-then-insert without a ticket lock. A close landing between the
        // check and the insert can let one message through; ticket appends are
        // low-contention and the window is accepted.
        let ticket = self
            .get_support_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if ticket.status == TicketStatus::Closed {
            return Err(ServiceError::TicketClosed(ticket_id));
        }

        let msg = sqlx::query_as::<_, SupportMessage>(
            r#"
            INSERT INTO support_messages (ticket_id, user_id, message, is_staff_reply)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(message)
        .bind(is_staff_reply)
        .fetch_one(&self.pool)
        .await?;

        Ok(msg)
    }

    async fn get_ticket_messages(&self, ticket_id: Uuid) -> Result<Vec<SupportMessage>, ServiceError> {
        let messages = sqlx::query_as::<_, SupportMessage>(
            r#"
            SELECT * FROM support_messages
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, ServiceError> {
        let ticket = self
            .get_support_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        transitions::check_ticket_transition(ticket_id, ticket.status, status)?;

        let updated = sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(status)
        .bind(ticket.status)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| {
            ServiceError::InvalidTransition {
                entity: "ticket",
                from: ticket.status.to_str().to_string(),
                to: status.to_str().to_string(),
            }
        })
    }
}
