// db/marketdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::marketmodel::*;

#[async_trait]
pub trait MarketExt {
    // Professional profiles
    async fn create_professional_profile(
        &self,
        user_id: Uuid,
        category: ServiceCategory,
        bio: String,
        hourly_rate: Option<f64>,
        location_state: String,
        location_city: String,
    ) -> Result<ProfessionalProfile, Error>;

    async fn get_professional_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfessionalProfile>, Error>;

    async fn update_professional_profile(
        &self,
        profile_id: Uuid,
        category: Option<ServiceCategory>,
        bio: Option<String>,
        hourly_rate: Option<f64>,
        location_state: Option<String>,
        location_city: Option<String>,
    ) -> Result<ProfessionalProfile, Error>;

    async fn update_professional_availability(
        &self,
        profile_id: Uuid,
        is_available: bool,
    ) -> Result<ProfessionalProfile, Error>;

    async fn search_professionals(
        &self,
        category: Option<ServiceCategory>,
        state: Option<&str>,
        city: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProfessionalProfile>, Error>;

    async fn bump_completed_jobs(&self, profile_id: Uuid) -> Result<(), Error>;

    // Service requests
    async fn create_service_request(
        &self,
        client_id: Uuid,
        category: ServiceCategory,
        title: String,
        description: String,
        location_state: String,
        location_city: String,
        budget: f64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<ServiceRequest, Error>;

    async fn get_service_request_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, Error>;

    async fn search_service_requests(
        &self,
        category: Option<ServiceCategory>,
        state: Option<&str>,
        status: RequestStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServiceRequest>, Error>;

    async fn get_client_requests(&self, client_id: Uuid) -> Result<Vec<ServiceRequest>, Error>;

    async fn cancel_service_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, Error>;

    // Offers
    async fn create_offer(
        &self,
        request_id: Uuid,
        professional_id: Uuid,
        price: f64,
        message: String,
        estimated_days: i32,
    ) -> Result<Offer, Error>;

    async fn get_offer_by_id(&self, offer_id: Uuid) -> Result<Option<Offer>, Error>;

    async fn get_offers_for_request(&self, request_id: Uuid) -> Result<Vec<Offer>, Error>;

    async fn get_professional_offers(
        &self,
        professional_id: Uuid,
    ) -> Result<Vec<Offer>, Error>;

    async fn withdraw_offer(&self, offer_id: Uuid) -> Result<Option<Offer>, Error>;

    /// Accept an offer: mark the request matched, accept this offer, reject
    /// the other pending offers and instantiate the job — all in a single
    /// database transaction. The request update is guarded on `status =
    /// 'open'` so a concurrent acceptance loses cleanly.
    async fn accept_offer_transaction(
        &self,
        offer: &Offer,
        client_id: Uuid,
    ) -> Result<Option<Job>, Error>;

    // Jobs
    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, Error>;

    async fn mark_job_delivered(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn mark_job_completed(&self, job_id: Uuid) -> Result<Job, Error>;

    async fn get_jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, Error>;

    async fn get_jobs_for_professional(
        &self,
        professional_id: Uuid,
    ) -> Result<Vec<Job>, Error>;
}

#[async_trait]
impl MarketExt for DBClient {
    async fn create_professional_profile(
        &self,
        user_id: Uuid,
        category: ServiceCategory,
        bio: String,
        hourly_rate: Option<f64>,
        location_state: String,
        location_city: String,
    ) -> Result<ProfessionalProfile, Error> {
        let hourly_rate_bd = hourly_rate.and_then(|rate| BigDecimal::try_from(rate).ok());

        sqlx::query_as::<_, ProfessionalProfile>(
            r#"
            INSERT INTO professional_profiles
            (user_id, category, bio, hourly_rate, location_state, location_city)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, category, bio, hourly_rate,
                      location_state, location_city, is_available, rating,
                      completed_jobs, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(bio)
        .bind(hourly_rate_bd)
        .bind(location_state)
        .bind(location_city)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_professional_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfessionalProfile>, Error> {
        sqlx::query_as::<_, ProfessionalProfile>(
            r#"
            SELECT id, user_id, category, bio, hourly_rate,
                   location_state, location_city, is_available, rating,
                   completed_jobs, created_at, updated_at
            FROM professional_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_professional_profile(
        &self,
        profile_id: Uuid,
        category: Option<ServiceCategory>,
        bio: Option<String>,
        hourly_rate: Option<f64>,
        location_state: Option<String>,
        location_city: Option<String>,
    ) -> Result<ProfessionalProfile, Error> {
        let hourly_rate_bd = hourly_rate.and_then(|rate| BigDecimal::try_from(rate).ok());

        sqlx::query_as::<_, ProfessionalProfile>(
            r#"
            UPDATE professional_profiles
            SET category = COALESCE($2, category),
                bio = COALESCE($3, bio),
                hourly_rate = COALESCE($4, hourly_rate),
                location_state = COALESCE($5, location_state),
                location_city = COALESCE($6, location_city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, category, bio, hourly_rate,
                      location_state, location_city, is_available, rating,
                      completed_jobs, created_at, updated_at
            "#,
        )
        .bind(profile_id)
        .bind(category)
        .bind(bio)
        .bind(hourly_rate_bd)
        .bind(location_state)
        .bind(location_city)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_professional_availability(
        &self,
        profile_id: Uuid,
        is_available: bool,
    ) -> Result<ProfessionalProfile, Error> {
        sqlx::query_as::<_, ProfessionalProfile>(
            r#"
            UPDATE professional_profiles
            SET is_available = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, category, bio, hourly_rate,
                      location_state, location_city, is_available, rating,
                      completed_jobs, created_at, updated_at
            "#,
        )
        .bind(profile_id)
        .bind(is_available)
        .fetch_one(&self.pool)
        .await
    }

    async fn search_professionals(
        &self,
        category: Option<ServiceCategory>,
        state: Option<&str>,
        city: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProfessionalProfile>, Error> {
        sqlx::query_as::<_, ProfessionalProfile>(
            r#"
            SELECT id, user_id, category, bio, hourly_rate,
                   location_state, location_city, is_available, rating,
                   completed_jobs, created_at, updated_at
            FROM professional_profiles
            WHERE is_available = TRUE
              AND ($1::service_category IS NULL OR category = $1)
              AND ($2::text IS NULL OR location_state = $2)
              AND ($3::text IS NULL OR location_city = $3)
            ORDER BY rating DESC NULLS LAST, completed_jobs DESC NULLS LAST
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(category)
        .bind(state)
        .bind(city)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn bump_completed_jobs(&self, profile_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE professional_profiles
            SET completed_jobs = COALESCE(completed_jobs, 0) + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_service_request(
        &self,
        client_id: Uuid,
        category: ServiceCategory,
        title: String,
        description: String,
        location_state: String,
        location_city: String,
        budget: f64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<ServiceRequest, Error> {
        let budget_bd = BigDecimal::try_from(budget)
            .map_err(|e| Error::Decode(Box::new(e)))?;

        sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests
            (client_id, category, title, description, location_state, location_city, budget, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, client_id, category, title, description,
                      location_state, location_city, budget, status, deadline,
                      created_at, updated_at
            "#,
        )
        .bind(client_id)
        .bind(category)
        .bind(title)
        .bind(description)
        .bind(location_state)
        .bind(location_city)
        .bind(budget_bd)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_service_request_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category, title, description,
                   location_state, location_city, budget, status, deadline,
                   created_at, updated_at
            FROM service_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn search_service_requests(
        &self,
        category: Option<ServiceCategory>,
        state: Option<&str>,
        status: RequestStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServiceRequest>, Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category, title, description,
                   location_state, location_city, budget, status, deadline,
                   created_at, updated_at
            FROM service_requests
            WHERE status = $1
              AND ($2::service_category IS NULL OR category = $2)
              AND ($3::text IS NULL OR location_state = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(status)
        .bind(category)
        .bind(state)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_client_requests(&self, client_id: Uuid) -> Result<Vec<ServiceRequest>, Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category, title, description,
                   location_state, location_city, budget, status, deadline,
                   created_at, updated_at
            FROM service_requests
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn cancel_service_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, Error> {
        // Only an open request can be cancelled
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = 'cancelled'::request_status, updated_at = NOW()
            WHERE id = $1 AND status = 'open'::request_status
            RETURNING id, client_id, category, title, description,
                      location_state, location_city, budget, status, deadline,
                      created_at, updated_at
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_offer(
        &self,
        request_id: Uuid,
        professional_id: Uuid,
        price: f64,
        message: String,
        estimated_days: i32,
    ) -> Result<Offer, Error> {
        let price_bd = BigDecimal::try_from(price)
            .map_err(|e| Error::Decode(Box::new(e)))?;

        sqlx::query_as::<_, Offer>(
            r#"
            INSERT INTO offers (request_id, professional_id, price, message, estimated_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, request_id, professional_id, price, message,
                      estimated_days, status, created_at, responded_at
            "#,
        )
        .bind(request_id)
        .bind(professional_id)
        .bind(price_bd)
        .bind(message)
        .bind(estimated_days)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_offer_by_id(&self, offer_id: Uuid) -> Result<Option<Offer>, Error> {
        sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, request_id, professional_id, price, message,
                   estimated_days, status, created_at, responded_at
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_offers_for_request(&self, request_id: Uuid) -> Result<Vec<Offer>, Error> {
        sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, request_id, professional_id, price, message,
                   estimated_days, status, created_at, responded_at
            FROM offers
            WHERE request_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_professional_offers(
        &self,
        professional_id: Uuid,
    ) -> Result<Vec<Offer>, Error> {
        sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, request_id, professional_id, price, message,
                   estimated_days, status, created_at, responded_at
            FROM offers
            WHERE professional_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn withdraw_offer(&self, offer_id: Uuid) -> Result<Option<Offer>, Error> {
        sqlx::query_as::<_, Offer>(
            r#"
            UPDATE offers
            SET status = 'withdrawn'::offer_status, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'::offer_status
            RETURNING id, request_id, professional_id, price, message,
                      estimated_days, status, created_at, responded_at
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn accept_offer_transaction(
        &self,
        offer: &Offer,
        client_id: Uuid,
    ) -> Result<Option<Job>, Error> {
        let mut tx = self.pool.begin().await?;

        // Guarded status flip: loses against a concurrent acceptance
        let matched = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = 'matched'::request_status, updated_at = NOW()
            WHERE id = $1 AND status = 'open'::request_status
            "#,
        )
        .bind(offer.request_id)
        .execute(&mut *tx)
        .await?;

        if matched.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE offers
            SET status = 'accepted'::offer_status, responded_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(offer.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE offers
            SET status = 'rejected'::offer_status, responded_at = NOW()
            WHERE request_id = $1 AND id != $2 AND status = 'pending'::offer_status
            "#,
        )
        .bind(offer.request_id)
        .bind(offer.id)
        .execute(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (request_id, offer_id, client_id, professional_id, agreed_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, request_id, offer_id, client_id, professional_id,
                      agreed_price, status, delivered_at, completed_at,
                      created_at, updated_at
            "#,
        )
        .bind(offer.request_id)
        .bind(offer.id)
        .bind(client_id)
        .bind(offer.professional_id)
        .bind(offer.price.clone())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(job))
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, request_id, offer_id, client_id, professional_id,
                   agreed_price, status, delivered_at, completed_at,
                   created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, request_id, offer_id, client_id, professional_id,
                      agreed_price, status, delivered_at, completed_at,
                      created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn mark_job_delivered(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'delivered'::job_status, delivered_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'active'::job_status
            RETURNING id, request_id, offer_id, client_id, professional_id,
                      agreed_price, status, delivered_at, completed_at,
                      created_at, updated_at
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_job_completed(&self, job_id: Uuid) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'completed'::job_status, completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING id, request_id, offer_id, client_id, professional_id,
                      agreed_price, status, delivered_at, completed_at,
                      created_at, updated_at
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_jobs_for_client(&self, client_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, request_id, offer_id, client_id, professional_id,
                   agreed_price, status, delivered_at, completed_at,
                   created_at, updated_at
            FROM jobs
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_jobs_for_professional(
        &self,
        professional_id: Uuid,
    ) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, request_id, offer_id, client_id, professional_id,
                   agreed_price, status, delivered_at, completed_at,
                   created_at, updated_at
            FROM jobs
            WHERE professional_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await
    }
}
