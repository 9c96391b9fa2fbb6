use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserPatch};
use super::UserError;

impl Entity for User {
    const PREFIX: &'static str = "user";
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    type Action = ();
    type ActionResult = ();
    type Error = UserError;

    /// Creates a new User from creation parameters.
    ///
    /// # Errors
    /// Rejects an email address without an `@`.
    fn from_create(id: String, params: UserCreate) -> Result<Self, UserError> {
        validate_email(&params.email)?;
        Ok(Self {
            id,
            name: params.name,
            email: params.email,
            role: params.role,
        })
    }

    /// Updates the user's profile information.
    ///
    /// # Fields Updated
    /// - `name`: User's display name
    /// - `email`: User's email address
    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(email) = patch.email {
            validate_email(&email)?;
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        Ok(())
    }

    /// Currently, no custom actions are defined for users.
    fn handle_action(&mut self, _action: ()) -> Result<(), UserError> {
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), UserError> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(UserError::ValidationError(format!("invalid email: {email}")))
    }
}
