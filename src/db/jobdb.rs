use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::*;
use crate::service::error::ServiceError;
use crate::service::transitions;

#[async_trait]
pub trait JobExt {
    async fn create_job(&self, customer_id: Uuid, new_job: NewJob) -> Result<Job, ServiceError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError>;

    async fn list_jobs(
        &self,
        category: Option<JobCategory>,
        status: Option<JobStatus>,
        urgency: Option<UrgencyLevel>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, ServiceError>;

    async fn list_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<Job>, ServiceError>;

    /// Guarded status flip: applies only when the job is still in `from`.
    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Job, ServiceError>;

    /// Closes bidding on every active job whose deadline has passed and
    /// returns the jobs that were flipped.
    async fn close_expired_bidding(&self, now: DateTime<Utc>) -> Result<Vec<Job>, ServiceError>;

    async fn create_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        new_bid: NewBid,
        now: DateTime<Utc>,
    ) -> Result<Bid, ServiceError>;

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError>;

    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<Bid>, ServiceError>;

    async fn get_provider_bids(&self, provider_id: Uuid) -> Result<Vec<Bid>, ServiceError>;

    /// The acceptance cascade: winning bid -> accepted, sibling pending bids
    /// -> rejected, job -> in_progress. All-or-nothing; the first acceptance
    /// to commit wins and later attempts get `AcceptConflict`.
    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid, Vec<Bid>), ServiceError>;

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError>;

    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError>;

    /// Cancels the job and rejects all still-pending bids in one unit.
    async fn cancel_job(&self, job_id: Uuid) -> Result<(Job, Vec<Bid>), ServiceError>;

    /// Marks an in-progress job completed and stamps the winning bid.
    async fn complete_job(
        &self,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid), ServiceError>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, customer_id: Uuid, new_job: NewJob) -> Result<Job, ServiceError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                customer_id, category, title, description, location_address,
                payment_type, fixed_price, hourly_rate, budget_max, urgency,
                materials_provided, bidding_start_date, bidding_end_date,
                project_start_date, project_end_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(new_job.category)
        .bind(new_job.title)
        .bind(new_job.description)
        .bind(new_job.location_address)
        .bind(new_job.payment_type)
        .bind(new_job.fixed_price)
        .bind(new_job.hourly_rate)
        .bind(new_job.budget_max)
        .bind(new_job.urgency)
        .bind(new_job.materials_provided)
        .bind(new_job.bidding_start_date)
        .bind(new_job.bidding_end_date)
        .bind(new_job.project_start_date)
        .bind(new_job.project_end_date)
        .bind(JobStatus::Draft)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn list_jobs(
        &self,
        category: Option<JobCategory>,
        status: Option<JobStatus>,
        urgency: Option<UrgencyLevel>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, ServiceError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE ($1::job_category IS NULL OR category = $1)
              AND ($2::job_status IS NULL OR status = $2)
              AND ($3::urgency_level IS NULL OR urgency = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(category)
        .bind(status)
        .bind(urgency)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn list_customer_jobs(&self, customer_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Job, ServiceError> {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(job) => Ok(job),
            // Zero rows: the job is gone or moved on since the caller read it.
            None => match self.get_job(job_id).await? {
                Some(job) => Err(ServiceError::InvalidJobStatus(
                    job_id,
                    job.status.to_str().to_string(),
                )),
                None => Err(ServiceError::JobNotFound(job_id)),
            },
        }
    }

    async fn close_expired_bidding(&self, now: DateTime<Utc>) -> Result<Vec<Job>, ServiceError> {
        let closed = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE status = $3
              AND bidding_end_date IS NOT NULL
              AND bidding_end_date <= $1
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(JobStatus::BiddingClosed)
        .bind(JobStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(closed)
    }

    async fn create_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        new_bid: NewBid,
        now: DateTime<Utc>,
    ) -> Result<Bid, ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Lock the job row so a concurrent close cannot slip between the
        // window check and the insert.
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !transitions::bidding_window_open(&job, now) {
            return Err(ServiceError::BiddingClosed(job_id));
        }

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            INSERT INTO bids (
                job_id, provider_id, amount, estimated_hours, hourly_rate,
                deposit_option, custom_deposit_percentage, deposit_amount,
                proposal, status, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(provider_id)
        .bind(new_bid.amount)
        .bind(new_bid.estimated_hours)
        .bind(new_bid.hourly_rate)
        .bind(new_bid.deposit_option)
        .bind(new_bid.custom_deposit_percentage)
        .bind(new_bid.deposit_amount)
        .bind(new_bid.proposal)
        .bind(BidStatus::Pending)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError> {
        let bid = sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE id = $1")
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bid)
    }

    async fn get_job_bids(&self, job_id: Uuid) -> Result<Vec<Bid>, ServiceError> {
        let bids = sqlx::query_as::<_, Bid>(
            r#"
            SELECT * FROM bids
            WHERE job_id = $1
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }

    async fn get_provider_bids(&self, provider_id: Uuid) -> Result<Vec<Bid>, ServiceError> {
        let bids = sqlx::query_as::<_, Bid>(
            r#"
            SELECT * FROM bids
            WHERE provider_id = $1
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }

    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid, Vec<Bid>), ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Serialize acceptances per job: the row lock makes the second racer
        // re-read the job after the first one committed, and the status guard
        // below turns that into AcceptConflict.
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let bid = sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE id = $1 FOR UPDATE")
            .bind(bid_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        transitions::check_bid_acceptance(&job, &bid)?;

        let winner = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2, accepted_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(BidStatus::Accepted)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let losers = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $3
            WHERE job_id = $1 AND id <> $2 AND status = $4
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(bid_id)
        .bind(BidStatus::Rejected)
        .bind(BidStatus::Pending)
        .fetch_all(&mut *tx)
        .await?;

        let updated_job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, winning_bid_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::InProgress)
        .bind(bid_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((updated_job, winner, losers))
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let updated = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(BidStatus::Rejected)
        .bind(BidStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(bid) => Ok(bid),
            None => match self.get_bid(bid_id).await? {
                Some(_) => Err(ServiceError::BidNotPending(bid_id)),
                None => Err(ServiceError::BidNotFound(bid_id)),
            },
        }
    }

    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let updated = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(BidStatus::Withdrawn)
        .bind(BidStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(bid) => Ok(bid),
            None => match self.get_bid(bid_id).await? {
                Some(_) => Err(ServiceError::BidNotPending(bid_id)),
                None => Err(ServiceError::BidNotFound(bid_id)),
            },
        }
    }

    async fn cancel_job(&self, job_id: Uuid) -> Result<(Job, Vec<Bid>), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        transitions::check_job_transition(job.status, JobStatus::Cancelled)?;

        let rejected = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = $2
            WHERE job_id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(BidStatus::Rejected)
        .bind(BidStatus::Pending)
        .fetch_all(&mut *tx)
        .await?;

        let cancelled = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Cancelled)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((cancelled, rejected))
    }

    async fn complete_job(
        &self,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Bid), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        transitions::check_job_transition(job.status, JobStatus::Completed)?;

        let winning_bid_id = job.winning_bid_id.ok_or_else(|| {
            ServiceError::InvalidJobStatus(job_id, job.status.to_str().to_string())
        })?;

        let winning_bid = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET completed_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(winning_bid_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let completed = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Completed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((completed, winning_bid))
    }
}
