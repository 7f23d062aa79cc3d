//! Role-based authorization
//!
//! One function decides every billing permission. Superadmins may do
//! anything; everyone else needs the right role in the condominium the
//! action targets.

use std::sync::Arc;

use condomi_core::models::{ResourceKind, Role};
use condomi_core::AppError;
use condomi_db::AccessStore;
use uuid::Uuid;

/// Something a user is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ConsumeQuota {
        condominium_id: Uuid,
        kind: ResourceKind,
    },
    ViewBilling {
        condominium_id: Uuid,
    },
    GeneratePix {
        condominium_id: Uuid,
    },
    /// Plans, ad-hoc invoices, manual payments, rollover, cross-tenant views.
    ManageBilling,
}

impl Action {
    fn condominium_id(&self) -> Option<Uuid> {
        match self {
            Action::ConsumeQuota { condominium_id, .. }
            | Action::ViewBilling { condominium_id }
            | Action::GeneratePix { condominium_id } => Some(*condominium_id),
            Action::ManageBilling => None,
        }
    }

    /// Condominium-scoped roles allowed to perform the action.
    fn scoped_roles(&self) -> &'static [Role] {
        match self {
            Action::ConsumeQuota {
                kind: ResourceKind::PackageNotification,
                ..
            } => &[Role::Sindico, Role::Porteiro],
            Action::ConsumeQuota { .. } | Action::ViewBilling { .. } | Action::GeneratePix { .. } => {
                &[Role::Sindico]
            }
            Action::ManageBilling => &[],
        }
    }
}

#[derive(Clone)]
pub struct Authorizer {
    access: Arc<dyn AccessStore>,
}

impl Authorizer {
    pub fn new(access: Arc<dyn AccessStore>) -> Self {
        Self { access }
    }

    pub async fn is_superadmin(&self, user_id: Uuid) -> Result<bool, AppError> {
        self.access.has_role(user_id, Role::Superadmin, None).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_allowed(&self, user_id: Uuid, action: Action) -> Result<bool, AppError> {
        if self.is_superadmin(user_id).await? {
            return Ok(true);
        }
        let Some(condominium_id) = action.condominium_id() else {
            return Ok(false);
        };

        let memberships = self.access.get_user_condominium_ids(user_id).await?;
        if !memberships.contains(&condominium_id) {
            return Ok(false);
        }
        for role in action.scoped_roles() {
            if self
                .access
                .has_role(user_id, *role, Some(condominium_id))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Like [`Authorizer::authorize`], but a denial comes back as `hidden`
    /// so a resource the caller may not see looks the same as a missing one.
    pub async fn authorize_or_hide(
        &self,
        user_id: Uuid,
        action: Action,
        hidden: AppError,
    ) -> Result<(), AppError> {
        if self.is_allowed(user_id, action).await? {
            Ok(())
        } else {
            tracing::debug!(user_id = %user_id, ?action, "Authorization denied; resource hidden");
            Err(hidden)
        }
    }

    /// `Forbidden` unless `user_id` may perform `action`.
    pub async fn authorize(&self, user_id: Uuid, action: Action) -> Result<(), AppError> {
        if self.is_allowed(user_id, action).await? {
            Ok(())
        } else {
            tracing::debug!(user_id = %user_id, ?action, "Authorization denied");
            Err(AppError::Forbidden(
                "You do not have permission for this action".to_string(),
            ))
        }
    }
}
