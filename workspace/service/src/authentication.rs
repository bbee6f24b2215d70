//! Phone/password login, including the case where one phone number holds
//! accounts in several roles.

use model::entities::account;
use model::entities::prelude::*;
use model::Role;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::password::PasswordService;

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Exactly one account accepted the password.
    Authenticated(account::Model),
    /// The password matched accounts in more than one role; the client has
    /// to pick one and call `login_with_role`.
    RoleSelectionRequired(Vec<account::Model>),
}

pub struct Authenticator<'a> {
    db: &'a DatabaseConnection,
    passwords: &'a PasswordService,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a DatabaseConnection, passwords: &'a PasswordService) -> Self {
        Self { db, passwords }
    }

    #[instrument(skip_all)]
    pub async fn login(&self, phone_number: &str, password: &str) -> Result<LoginOutcome> {
        trace!("Entering login function");
        let candidates = Account::find()
            .filter(account::Column::PhoneNumber.eq(phone_number.trim()))
            .order_by_asc(account::Column::Role)
            .all(self.db)
            .await?;
        debug!("Found {} account(s) for phone number", candidates.len());

        let mut matched = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.passwords.verify(password, &candidate.password_hash).await {
                matched.push(candidate);
            }
        }

        match matched.len() {
            0 => {
                warn!("Login rejected");
                Err(ServiceError::InvalidCredentials)
            }
            1 => {
                let account = matched.remove(0);
                info!("Login succeeded for {} account {}", account.role, account.id);
                Ok(LoginOutcome::Authenticated(account))
            }
            n => {
                info!("Password matched {} roles, asking for role selection", n);
                Ok(LoginOutcome::RoleSelectionRequired(matched))
            }
        }
    }

    #[instrument(skip(self, phone_number, password))]
    pub async fn login_with_role(
        &self,
        phone_number: &str,
        password: &str,
        role: Role,
    ) -> Result<account::Model> {
        let account = Account::find()
            .filter(account::Column::PhoneNumber.eq(phone_number.trim()))
            .filter(account::Column::Role.eq(role))
            .one(self.db)
            .await?;

        let Some(account) = account else {
            warn!("Role login rejected, no such account");
            return Err(ServiceError::InvalidCredentials);
        };

        if self.passwords.verify(password, &account.password_hash).await {
            info!("Role login succeeded for account {}", account.id);
            Ok(account)
        } else {
            warn!("Role login rejected");
            Err(ServiceError::InvalidCredentials)
        }
    }
}
