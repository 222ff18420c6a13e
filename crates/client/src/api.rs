//! # Booking API Client
//!
//! Typed access to the meeting-room backend's REST endpoints.
//!
//! [`BookingApi`] is the narrow seam the booking panel depends on (reading a
//! room's bookings for a day and creating one), so it can be exercised
//! against a mock. [`HttpApi`] implements it over `reqwest` together with the
//! rest of the endpoints: authentication, rooms, personal bookings and the
//! administrator operations.
//!
//! Non-2xx responses are turned into [`BookingError`] by status code, with
//! the backend's `error` message passed through verbatim. Nothing is retried.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, RequestBuilder, StatusCode};
use roombook_core::{
    errors::{BookingError, BookingResult},
    models::{
        booking::{
            Booking, BookingDetail, BookingId, CreateBookingRequest, CreateBookingResponse,
            ListBookingDetailsResponse, ListBookingsResponse,
        },
        room::{AddRoomRequest, EditRoomRequest, ListRoomsResponse, Room, RoomId, RoomResponse},
        settings::{SettingsResponse, SystemSettings, UpdateSettingsRequest},
        user::{
            AdminChangeUserPasswordRequest, ChangePasswordRequest, ListUsersResponse,
            LoginRequest, LoginResponse, RegisterResponse, UpdateProfileRequest,
            UpdateProfileResponse, UserAccount, UserId, UserInfo,
        },
        ErrorResponse, MessageResponse,
    },
    slots::BookingInterval,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::{config::ClientConfig, session::Session};

/// The booking operations the slot panel needs.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Bookings of `room_id` that intersect `window`.
    async fn list_bookings(
        &self,
        session: &Session,
        room_id: RoomId,
        window: BookingInterval,
    ) -> BookingResult<Vec<Booking>>;

    /// Creates a booking. The backend re-checks for conflicts.
    async fn create_booking(
        &self,
        session: &Session,
        request: &CreateBookingRequest,
    ) -> BookingResult<Booking>;
}

/// Maps a non-2xx status and message to the error taxonomy.
///
/// A 401 here is a credentials failure; requests that carried the session
/// token report 401 as [`BookingError::SessionExpired`] instead.
pub fn error_from_status(status: u16, message: String) -> BookingError {
    match status {
        400 => BookingError::Validation(message),
        401 => BookingError::Authentication(message),
        403 => BookingError::Authorization(message),
        404 => BookingError::NotFound(message),
        409 => BookingError::Conflict(message),
        _ => BookingError::Api { status, message },
    }
}

pub struct HttpApi {
    client: Client,
    config: ClientConfig,
}

impl HttpApi {
    pub fn new(config: ClientConfig) -> BookingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BookingError::Transport(e.into()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Authentication

    /// Logs in and loads the user's profile into the new session.
    pub async fn login(&self, username: &str, password: &str) -> BookingResult<Session> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send(self.client.post(self.config.endpoint("/api/login")).json(&request))
            .await?;

        let session = Session::new(response.token);
        let user = self.user_info(&session).await?;
        info!(username = %user.username, role = %user.role, "logged in");

        Ok(session.with_user(user))
    }

    pub async fn register(&self, username: &str, password: &str) -> BookingResult<Session> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: RegisterResponse = self
            .send(
                self.client
                    .post(self.config.endpoint("/api/register"))
                    .json(&request),
            )
            .await?;
        info!(username = %response.user.username, "registered");

        let user = UserInfo {
            user_id: response.user.id,
            username: response.user.username,
            role: response.user.role,
            nickname: response.user.nickname,
            system_settings: None,
        };
        Ok(Session::new(response.token).with_user(user))
    }

    pub async fn user_info(&self, session: &Session) -> BookingResult<UserInfo> {
        self.get(session, "/api/user/info").await
    }

    /// Changes the nickname and swaps the re-issued token into `session`.
    pub async fn update_profile(
        &self,
        session: &mut Session,
        nickname: &str,
    ) -> BookingResult<UserInfo> {
        let request = UpdateProfileRequest {
            nickname: nickname.to_string(),
        };
        let response: UpdateProfileResponse =
            self.put(session, "/api/user/profile", &request).await?;

        session.refresh(response.token, response.user.clone());
        Ok(response.user)
    }

    /// Changes the signed-in user's password.
    ///
    /// Checks the public settings first and refuses locally when the
    /// administrator has disabled password changes.
    pub async fn change_password(
        &self,
        session: &Session,
        old_password: &str,
        new_password: &str,
    ) -> BookingResult<String> {
        if !self.settings().await?.allow_user_change_password {
            return Err(BookingError::Authorization(
                "Password changes are disabled by the administrator".to_string(),
            ));
        }

        let request = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        let response: MessageResponse = self.put(session, "/api/user/password", &request).await?;
        Ok(response.message)
    }

    /// Public settings; no session required.
    pub async fn settings(&self) -> BookingResult<SystemSettings> {
        let response: SettingsResponse = self
            .send(self.client.get(self.config.endpoint("/api/settings")))
            .await?;
        Ok(response.settings)
    }

    // Rooms

    pub async fn list_rooms(&self, session: &Session) -> BookingResult<Vec<Room>> {
        let response: ListRoomsResponse = self.get(session, "/api/rooms").await?;
        Ok(response.rooms)
    }

    pub async fn add_room(
        &self,
        session: &Session,
        name: &str,
        capacity: i64,
    ) -> BookingResult<Room> {
        let request = AddRoomRequest {
            name: name.to_string(),
            capacity,
        };
        let response: RoomResponse = self.post(session, "/api/rooms", &request).await?;
        info!(room_id = response.room.id, name = %response.room.name, "room added");
        Ok(response.room)
    }

    pub async fn edit_room(
        &self,
        session: &Session,
        room_id: RoomId,
        request: &EditRoomRequest,
    ) -> BookingResult<Room> {
        let response: RoomResponse = self
            .put(session, &format!("/api/rooms/{}", room_id), request)
            .await?;
        Ok(response.room)
    }

    pub async fn delete_room(&self, session: &Session, room_id: RoomId) -> BookingResult<()> {
        let _: MessageResponse = self
            .delete(session, &format!("/api/rooms/{}", room_id))
            .await?;
        info!(room_id, "room deleted");
        Ok(())
    }

    // Bookings

    pub async fn my_bookings(&self, session: &Session) -> BookingResult<Vec<Booking>> {
        let response: ListBookingsResponse = self.get(session, "/api/mybookings").await?;
        Ok(response.bookings)
    }

    pub async fn cancel_booking(
        &self,
        session: &Session,
        booking_id: BookingId,
    ) -> BookingResult<()> {
        let _: MessageResponse = self
            .delete(session, &format!("/api/bookings/{}", booking_id))
            .await?;
        info!(booking_id, "booking cancelled");
        Ok(())
    }

    // Administration

    pub async fn admin_bookings(&self, session: &Session) -> BookingResult<Vec<BookingDetail>> {
        let response: ListBookingDetailsResponse =
            self.get(session, "/api/admin/bookings").await?;
        Ok(response.bookings)
    }

    pub async fn admin_users(&self, session: &Session) -> BookingResult<Vec<UserAccount>> {
        let response: ListUsersResponse = self.get(session, "/api/admin/users").await?;
        Ok(response.users)
    }

    pub async fn admin_change_user_password(
        &self,
        session: &Session,
        user_id: UserId,
        new_password: &str,
    ) -> BookingResult<String> {
        let request = AdminChangeUserPasswordRequest {
            user_id,
            new_password: new_password.to_string(),
        };
        let response: MessageResponse = self
            .put(session, "/api/admin/user/password", &request)
            .await?;
        Ok(response.message)
    }

    pub async fn admin_settings(&self, session: &Session) -> BookingResult<SystemSettings> {
        let response: SettingsResponse = self.get(session, "/api/admin/settings").await?;
        Ok(response.settings)
    }

    pub async fn update_settings(
        &self,
        session: &Session,
        allow_user_change_password: bool,
    ) -> BookingResult<SystemSettings> {
        let request = UpdateSettingsRequest {
            allow_user_change_password,
        };
        let response: SettingsResponse =
            self.put(session, "/api/admin/settings", &request).await?;
        Ok(response.settings)
    }

    // Plumbing

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            self.config.auth_scheme.header_value(session.token()),
        )
    }

    async fn get<T: DeserializeOwned>(&self, session: &Session, path: &str) -> BookingResult<T> {
        let builder = self.client.get(self.config.endpoint(path));
        self.send_authorized(builder, session).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> BookingResult<T> {
        let builder = self.client.post(self.config.endpoint(path)).json(body);
        self.send_authorized(builder, session).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> BookingResult<T> {
        let builder = self.client.put(self.config.endpoint(path)).json(body);
        self.send_authorized(builder, session).await
    }

    async fn delete<T: DeserializeOwned>(&self, session: &Session, path: &str) -> BookingResult<T> {
        let builder = self.client.delete(self.config.endpoint(path));
        self.send_authorized(builder, session).await
    }

    /// Sends a request without credentials.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> BookingResult<T> {
        self.dispatch(builder, false).await
    }

    /// Sends a request carrying the session token; a 401 means the token was rejected.
    async fn send_authorized<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        session: &Session,
    ) -> BookingResult<T> {
        self.dispatch(self.authorized(builder, session), true).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        with_token: bool,
    ) -> BookingResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| BookingError::Transport(e.into()))?;

        let status = response.status();
        let url = response.url().path().to_string();
        debug!(%url, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => error.error,
                Err(_) if !body.trim().is_empty() => body,
                Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
            };
            warn!(%url, status = status.as_u16(), %message, "request rejected");
            if with_token && status == StatusCode::UNAUTHORIZED {
                return Err(BookingError::SessionExpired(message));
            }
            return Err(error_from_status(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BookingError::Transport(e.into()))
    }
}

#[async_trait]
impl BookingApi for HttpApi {
    async fn list_bookings(
        &self,
        session: &Session,
        room_id: RoomId,
        window: BookingInterval,
    ) -> BookingResult<Vec<Booking>> {
        let builder = self.client.get(self.config.endpoint("/api/bookings")).query(&[
            ("room_id", room_id.to_string()),
            (
                "start_time",
                window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "end_time",
                window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ]);
        let response: ListBookingsResponse = self.send_authorized(builder, session).await?;
        debug!(room_id, count = response.bookings.len(), "bookings loaded");

        Ok(response.bookings)
    }

    async fn create_booking(
        &self,
        session: &Session,
        request: &CreateBookingRequest,
    ) -> BookingResult<Booking> {
        let response: CreateBookingResponse = self.post(session, "/api/bookings", request).await?;
        info!(
            booking_id = response.booking.id,
            room_id = response.booking.room_id,
            start = %response.booking.start_time,
            end = %response.booking.end_time,
            "booking created"
        );

        Ok(response.booking)
    }
}
