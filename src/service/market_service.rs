// service/market_service.rs
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::marketdb::MarketExt,
    dtos::marketdtos::{CreateOfferDto, CreateServiceRequestDto},
    models::marketmodel::*,
    service::{error::ServiceError, notification_service::NotificationService},
    DBClient,
};

#[derive(Debug, Serialize)]
pub struct OfferAcceptanceResult {
    pub job: Job,
    pub offer: Offer,
    pub request: ServiceRequest,
}

#[derive(Debug, Clone)]
pub struct MarketService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl MarketService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn create_request(
        &self,
        client_id: Uuid,
        body: CreateServiceRequestDto,
    ) -> Result<ServiceRequest, ServiceError> {
        let request = self
            .db_client
            .create_service_request(
                client_id,
                body.category,
                body.title,
                body.description,
                body.location_state,
                body.location_city,
                body.budget,
                body.deadline,
            )
            .await?;

        tracing::info!(
            "Service request {} posted in {} ({})",
            request.id,
            request.location_state,
            request.category.to_str()
        );

        Ok(request)
    }

    pub async fn submit_offer(
        &self,
        request_id: Uuid,
        professional_user_id: Uuid,
        body: CreateOfferDto,
    ) -> Result<Offer, ServiceError> {
        self.db_client
            .get_professional_profile(professional_user_id)
            .await?
            .ok_or(ServiceError::ProfessionalProfileNotFound(professional_user_id))?;

        let request = self
            .db_client
            .get_service_request_by_id(request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound(request_id))?;

        if request.status != Some(RequestStatus::Open) {
            return Err(ServiceError::Validation(
                "Request is no longer open for offers".to_string(),
            ));
        }

        if request.client_id == professional_user_id {
            return Err(ServiceError::Validation(
                "Cannot submit an offer on your own request".to_string(),
            ));
        }

        let existing = self.db_client.get_offers_for_request(request_id).await?;
        if existing
            .iter()
            .any(|o| o.professional_id == professional_user_id && o.status == Some(OfferStatus::Pending))
        {
            return Err(ServiceError::Validation(
                "You already have a pending offer on this request".to_string(),
            ));
        }

        let offer = self
            .db_client
            .create_offer(
                request_id,
                professional_user_id,
                body.price,
                body.message,
                body.estimated_days,
            )
            .await?;

        self.notification_service
            .notify_offer_received(request.client_id, &request, &offer)
            .await?;

        Ok(offer)
    }

    /// Accept an offer and instantiate the job. The request flip, the offer
    /// updates and the job insert run in one database transaction; a
    /// concurrent acceptance of another offer on the same request loses the
    /// guarded update and surfaces as a conflict.
    pub async fn accept_offer(
        &self,
        offer_id: Uuid,
        client_id: Uuid,
    ) -> Result<OfferAcceptanceResult, ServiceError> {
        let offer = self
            .db_client
            .get_offer_by_id(offer_id)
            .await?
            .ok_or(ServiceError::OfferNotFound(offer_id))?;

        if offer.status != Some(OfferStatus::Pending) {
            return Err(ServiceError::Validation(
                "Offer is no longer pending".to_string(),
            ));
        }

        let request = self
            .db_client
            .get_service_request_by_id(offer.request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound(offer.request_id))?;

        if request.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, offer.request_id));
        }

        let job = self
            .db_client
            .accept_offer_transaction(&offer, client_id)
            .await?
            .ok_or(ServiceError::Validation(
                "Request was already matched".to_string(),
            ))?;

        let accepted_offer = self
            .db_client
            .get_offer_by_id(offer_id)
            .await?
            .ok_or(ServiceError::OfferNotFound(offer_id))?;
        let matched_request = self
            .db_client
            .get_service_request_by_id(offer.request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound(offer.request_id))?;

        self.notification_service
            .notify_offer_accepted(offer.professional_id, &matched_request, &job)
            .await?;

        Ok(OfferAcceptanceResult {
            job,
            offer: accepted_offer,
            request: matched_request,
        })
    }

    pub async fn withdraw_offer(
        &self,
        offer_id: Uuid,
        professional_user_id: Uuid,
    ) -> Result<Offer, ServiceError> {
        let offer = self
            .db_client
            .get_offer_by_id(offer_id)
            .await?
            .ok_or(ServiceError::OfferNotFound(offer_id))?;

        if offer.professional_id != professional_user_id {
            return Err(ServiceError::UnauthorizedJobAccess(
                professional_user_id,
                offer.request_id,
            ));
        }

        self.db_client
            .withdraw_offer(offer_id)
            .await?
            .ok_or(ServiceError::Validation(
                "Only a pending offer can be withdrawn".to_string(),
            ))
    }
}
