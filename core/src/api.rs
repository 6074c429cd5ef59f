//! One-call facade over `MarketClient` and a host [`Transport`].
//!
//! # Design
//! Every method runs the same three steps: validate locally, build the request
//! and hand it to the transport, parse the response. Validation failures never
//! reach the network. Nothing is retried; the caller re-triggers the action.

use crate::client::MarketClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::session::{Session, SessionContext};
use crate::types::{
    Interest, InterestStatus, InterestStatusUpdate, Listing, ListingInput, NewInterest,
    ProfileUpdate, UserProfile,
};
use crate::validate;

pub struct MarketApi<T> {
    client: MarketClient,
    transport: T,
}

impl<T: Transport> MarketApi<T> {
    pub fn new(client: MarketClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &MarketClient {
        &self.client
    }

    // --- crops ------------------------------------------------------------

    pub fn list_listings(&mut self, search: Option<&str>) -> Result<Vec<Listing>, ApiError> {
        let response = self.send(self.client.build_list_listings(search))?;
        self.client.parse_list_listings(response)
    }

    /// The six most recent listings, for the home page.
    pub fn latest_listings(&mut self) -> Result<Vec<Listing>, ApiError> {
        let response = self.send(self.client.build_latest_listings())?;
        self.client.parse_latest_listings(response)
    }

    pub fn get_listing(&mut self, id: &str) -> Result<Listing, ApiError> {
        let response = self.send(self.client.build_get_listing(id))?;
        self.client.parse_get_listing(response)
    }

    /// Lists a new crop owned by the signed-in user.
    pub fn create_listing(
        &mut self,
        session: &Session,
        input: &ListingInput,
    ) -> Result<Listing, ApiError> {
        validate::listing(input)?;
        let mut input = input.clone();
        input.owner = Some(session.as_owner());
        let client = self.client_for(session);
        let request = client.build_create_listing(&input, &session.email)?;
        let response = self.send(request)?;
        client.parse_create_listing(response)
    }

    pub fn update_listing(
        &mut self,
        session: &Session,
        id: &str,
        input: &ListingInput,
    ) -> Result<Listing, ApiError> {
        validate::listing(input)?;
        let client = self.client_for(session);
        let request = client.build_update_listing(id, input, &session.email)?;
        let response = self.send(request)?;
        client.parse_update_listing(response)
    }

    pub fn delete_listing(&mut self, session: &Session, id: &str) -> Result<(), ApiError> {
        let client = self.client_for(session);
        let response = self.send(client.build_delete_listing(id, &session.email))?;
        client.parse_delete_listing(response)
    }

    /// The signed-in user's own listings.
    pub fn my_listings(&mut self, session: &Session) -> Result<Vec<Listing>, ApiError> {
        let mut listings = self.list_listings(None)?;
        listings.retain(|l| l.is_owned_by(&session.email));
        Ok(listings)
    }

    // --- interests --------------------------------------------------------

    /// Sends the signed-in user's interest in `listing`.
    pub fn add_interest(
        &mut self,
        session: &Session,
        listing: &Listing,
        quantity: u32,
        message: &str,
    ) -> Result<Interest, ApiError> {
        let input = NewInterest {
            crop_id: listing.id.clone(),
            user_email: session.email.clone(),
            user_name: session.display_name().to_string(),
            quantity,
            message: message.to_string(),
        };
        validate::interest(&input, Some(listing))?;
        let client = self.client_for(session);
        let request = client.build_add_interest(&input)?;
        let response = self.send(request)?;
        client.parse_add_interest(response)
    }

    pub fn sent_interests(&mut self, session: &Session) -> Result<Vec<Interest>, ApiError> {
        let client = self.client_for(session);
        let response = self.send(client.build_sent_interests(&session.email))?;
        client.parse_sent_interests(response)
    }

    pub fn received_interests(&mut self, session: &Session) -> Result<Vec<Interest>, ApiError> {
        let client = self.client_for(session);
        let response = self.send(client.build_received_interests(&session.email))?;
        client.parse_received_interests(response)
    }

    /// Accepts or rejects a pending interest. Resolved interests are refused
    /// locally so a double click cannot resolve twice.
    pub fn respond_to_interest(
        &mut self,
        interest: &Interest,
        status: InterestStatus,
    ) -> Result<Interest, ApiError> {
        if !interest.status.can_transition_to(status) {
            return Err(ApiError::InvalidTransition {
                from: interest.status.to_string(),
                to: status.to_string(),
            });
        }
        let update = InterestStatusUpdate {
            interest_id: interest.id.clone(),
            crop_id: interest.crop_id.clone(),
            status,
        };
        let request = self.client.build_update_interest_status(&update)?;
        let response = self.send(request)?;
        self.client.parse_update_interest_status(response)
    }

    // --- users ------------------------------------------------------------

    pub fn create_user(&mut self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let request = self.client.build_create_user(profile)?;
        let response = self.send(request)?;
        self.client.parse_create_user(response)
    }

    pub fn get_user(&mut self, email: &str) -> Result<UserProfile, ApiError> {
        let response = self.send(self.client.build_get_user(email))?;
        self.client.parse_get_user(response)
    }

    pub fn list_users(&mut self) -> Result<Vec<UserProfile>, ApiError> {
        let response = self.send(self.client.build_list_users())?;
        self.client.parse_list_users(response)
    }

    pub fn update_user(
        &mut self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        validate::profile_update(update)?;
        let request = self.client.build_update_user(email, update)?;
        let response = self.send(request)?;
        self.client.parse_update_user(response)
    }

    /// Fetches the signed-in user's profile, creating it from the identity
    /// provider's data on first visit.
    pub fn load_profile(&mut self, session: &Session) -> Result<UserProfile, ApiError> {
        let client = self.client_for(session);
        let response = self.send(client.build_get_user(&session.email))?;
        match client.parse_get_user(response) {
            Err(e) if e.is_not_found() => {
                tracing::info!(email = %session.email, "creating profile on first visit");
                let fresh = UserProfile::bootstrap(
                    &session.email,
                    session.display_name(),
                    session.photo_url.as_deref(),
                );
                let response = self.send(client.build_create_user(&fresh)?)?;
                client.parse_create_user(response)
            }
            other => other,
        }
    }

    /// Saves a profile edit and patches the live session with the result.
    pub fn save_profile(
        &mut self,
        sessions: &mut SessionContext,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let session = sessions.actor()?.clone();
        validate::profile_update(update)?;
        let client = self.client_for(&session);
        let response = self.send(client.build_update_user(&session.email, update)?)?;
        let profile = client.parse_update_user(response)?;
        sessions.apply_profile(&profile);
        Ok(profile)
    }

    /// Calls made on behalf of a session carry the session's identity token;
    /// a session without one falls back to the configured token.
    fn client_for(&self, session: &Session) -> MarketClient {
        if session.token.trim().is_empty() {
            self.client.clone()
        } else {
            self.client.with_token(&session.token)
        }
    }

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        self.transport.execute(request).map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "transport failed");
            ApiError::Transport(e)
        })
    }
}
