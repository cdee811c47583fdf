use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::models::{AccessGrant, Module, Payment};
use crate::access::payment::{CardDetails, PaymentProcessor};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::portfolio::model::Template;
use crate::store::{AccessStore, ModuleStore};

/// A module together with whether the current user may use it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAccess {
    #[serde(flatten)]
    pub module: Module,
    pub usable: bool,
}

/// Outcome of picking a module in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Selection {
    #[serde(rename_all = "camelCase")]
    Unlocked { module_id: Uuid, template: Template },
    #[serde(rename_all = "camelCase")]
    Checkout { module_id: Uuid, checkout_url: String },
}

/// Where a checkout request lands before any card is charged.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutTarget {
    Login,
    Create,
    Module { module: Module, owned: bool },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub payment: Option<Payment>,
    pub grant: Option<AccessGrant>,
    pub selection: Selection,
}

pub fn checkout_url(module_id: Uuid) -> String {
    format!("/api/v1/modules/{module_id}/checkout")
}

#[derive(Clone)]
pub struct AccessGate {
    modules: Arc<dyn ModuleStore>,
    access: Arc<dyn AccessStore>,
    payments: Arc<dyn PaymentProcessor>,
}

impl AccessGate {
    pub fn new(
        modules: Arc<dyn ModuleStore>,
        access: Arc<dyn AccessStore>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            modules,
            access,
            payments,
        }
    }

    /// Module ids the user holds a grant for; empty when anonymous.
    pub async fn purchased(&self, user: Option<&SessionUser>) -> Result<HashSet<Uuid>, AppError> {
        let Some(user) = user else {
            return Ok(HashSet::new());
        };
        Ok(self
            .access
            .list_grants(user.id)
            .await?
            .into_iter()
            .map(|g| g.module_id)
            .collect())
    }

    pub async fn list_modules(
        &self,
        user: Option<&SessionUser>,
    ) -> Result<Vec<ModuleAccess>, AppError> {
        let modules = self.modules.list_active_modules().await?;
        let purchased = self.purchased(user).await?;
        Ok(modules
            .into_iter()
            .map(|module| ModuleAccess {
                usable: module.is_free || purchased.contains(&module.id),
                module,
            })
            .collect())
    }

    async fn active_module(&self, module_id: Uuid) -> Result<Option<Module>, AppError> {
        Ok(self
            .modules
            .get_module(module_id)
            .await?
            .filter(|m| m.is_active))
    }

    pub async fn select(
        &self,
        user: Option<&SessionUser>,
        module_id: Uuid,
    ) -> Result<Selection, AppError> {
        let module = self
            .active_module(module_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Module {module_id} not found")))?;

        if module.is_free || self.purchased(user).await?.contains(&module.id) {
            Ok(Selection::Unlocked {
                module_id,
                template: module.template_code,
            })
        } else {
            Ok(Selection::Checkout {
                module_id,
                checkout_url: checkout_url(module_id),
            })
        }
    }

    pub async fn checkout_target(
        &self,
        user: Option<&SessionUser>,
        module_id: Uuid,
    ) -> Result<CheckoutTarget, AppError> {
        if user.is_none() {
            return Ok(CheckoutTarget::Login);
        }
        let Some(module) = self.active_module(module_id).await? else {
            return Ok(CheckoutTarget::Create);
        };
        let owned = module.is_free || self.purchased(user).await?.contains(&module.id);
        Ok(CheckoutTarget::Module { module, owned })
    }

    /// Charges the card, then records the payment and the access grant.
    /// Both writes complete before the module is reported unlocked.
    /// Already-usable modules are unlocked without a charge.
    pub async fn purchase(
        &self,
        user: &SessionUser,
        module: &Module,
        card: &CardDetails,
    ) -> Result<Receipt, AppError> {
        let unlocked = Selection::Unlocked {
            module_id: module.id,
            template: module.template_code,
        };

        if module.is_free || self.purchased(Some(user)).await?.contains(&module.id) {
            return Ok(Receipt {
                payment: None,
                grant: None,
                selection: unlocked,
            });
        }

        let payment = self.payments.charge(user.id, module, card).await?;
        let payment = self.access.insert_payment(payment).await?;

        let grant = AccessGrant {
            id: Uuid::new_v4(),
            user_id: user.id,
            module_id: module.id,
            payment_id: Some(payment.id),
            granted_at: Utc::now(),
        };
        let grant = self.access.insert_grant(grant).await?;

        info!(
            "User {} purchased module {} ({})",
            user.id, module.id, payment.transaction_id
        );
        Ok(Receipt {
            payment: Some(payment),
            grant: Some(grant),
            selection: unlocked,
        })
    }

    /// Rejects a template whose modules are all locked for this user.
    /// Templates with no module on sale stay usable.
    pub async fn ensure_template_usable(
        &self,
        user: Option<&SessionUser>,
        template: Template,
    ) -> Result<(), AppError> {
        let offering: Vec<ModuleAccess> = self
            .list_modules(user)
            .await?
            .into_iter()
            .filter(|m| m.module.template_code == template)
            .collect();

        if offering.is_empty() || offering.iter().any(|m| m.usable) {
            Ok(())
        } else {
            warn!("Template {template} used without access");
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::payment::MockPaymentProcessor;
    use crate::auth::Role;
    use crate::store::MemoryStore;

    fn gate() -> (AccessGate, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_default_modules());
        let gate = AccessGate::new(
            store.clone(),
            store.clone(),
            Arc::new(MockPaymentProcessor),
        );
        (gate, store)
    }

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "jd@example.com".into(),
            role: Role::User,
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            card_holder: "Jean Dupont".into(),
            card_number: "4242424242424242".into(),
            expiry: "12/29".into(),
            cvc: "123".into(),
        }
    }

    async fn module_for(gate: &AccessGate, template: Template) -> Module {
        gate.list_modules(None)
            .await
            .unwrap()
            .into_iter()
            .find(|m| m.module.template_code == template)
            .unwrap()
            .module
    }

    #[tokio::test]
    async fn test_anonymous_sees_only_free_modules_usable() {
        let (gate, _) = gate();
        let listed = gate.list_modules(None).await.unwrap();
        assert_eq!(listed.len(), 4);
        for entry in listed {
            assert_eq!(entry.usable, entry.module.is_free);
        }
    }

    #[tokio::test]
    async fn test_locked_module_routes_to_checkout_for_its_id() {
        let (gate, _) = gate();
        let premium = module_for(&gate, Template::Professionnel).await;
        let selection = gate.select(Some(&user()), premium.id).await.unwrap();
        assert_eq!(
            selection,
            Selection::Checkout {
                module_id: premium.id,
                checkout_url: checkout_url(premium.id),
            }
        );
    }

    #[tokio::test]
    async fn test_free_module_unlocks() {
        let (gate, _) = gate();
        let free = module_for(&gate, Template::Minimaliste).await;
        assert!(matches!(
            gate.select(None, free.id).await.unwrap(),
            Selection::Unlocked { .. }
        ));
    }

    #[tokio::test]
    async fn test_purchase_writes_grant_before_unlock() {
        let (gate, store) = gate();
        let user = user();
        let premium = module_for(&gate, Template::Creatif).await;

        let receipt = gate.purchase(&user, &premium, &card()).await.unwrap();
        let payment = receipt.payment.unwrap();
        let grant = receipt.grant.unwrap();
        assert_eq!(grant.payment_id, Some(payment.id));

        let grants = store.list_grants(user.id).await.unwrap();
        assert_eq!(grants, vec![grant]);
        assert!(matches!(
            gate.select(Some(&user), premium.id).await.unwrap(),
            Selection::Unlocked { .. }
        ));
    }

    #[tokio::test]
    async fn test_second_purchase_does_not_charge_again() {
        let (gate, store) = gate();
        let user = user();
        let premium = module_for(&gate, Template::Creatif).await;
        gate.purchase(&user, &premium, &card()).await.unwrap();
        let again = gate.purchase(&user, &premium, &card()).await.unwrap();
        assert!(again.payment.is_none());
        assert_eq!(store.list_grants(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_card_writes_nothing() {
        let (gate, store) = gate();
        let user = user();
        let premium = module_for(&gate, Template::Creatif).await;
        let bad = CardDetails {
            cvc: "1".into(),
            ..card()
        };
        assert!(matches!(
            gate.purchase(&user, &premium, &bad).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.list_grants(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_target_redirects() {
        let (gate, _) = gate();
        let premium = module_for(&gate, Template::Creatif).await;
        assert_eq!(
            gate.checkout_target(None, premium.id).await.unwrap(),
            CheckoutTarget::Login
        );
        assert_eq!(
            gate.checkout_target(Some(&user()), Uuid::new_v4())
                .await
                .unwrap(),
            CheckoutTarget::Create
        );
    }

    #[tokio::test]
    async fn test_premium_template_requires_access() {
        let (gate, _) = gate();
        let user = user();
        assert!(gate
            .ensure_template_usable(Some(&user), Template::Moderne)
            .await
            .is_ok());
        assert!(matches!(
            gate.ensure_template_usable(Some(&user), Template::Professionnel)
                .await,
            Err(AppError::Forbidden)
        ));

        let premium = module_for(&gate, Template::Professionnel).await;
        gate.purchase(&user, &premium, &card()).await.unwrap();
        assert!(gate
            .ensure_template_usable(Some(&user), Template::Professionnel)
            .await
            .is_ok());
    }
}
