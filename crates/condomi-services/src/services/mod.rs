//! Business services

pub mod authorization;
pub mod clock;
pub mod gateway;
pub mod invoice;
pub mod pix;
pub mod plan;
pub mod subscription;
pub mod usage;

use std::sync::Arc;

use condomi_core::billing::RolloverPolicy;
use condomi_core::BillingConfig;
use condomi_db::Stores;

use self::authorization::Authorizer;
use self::clock::Clock;
use self::gateway::PaymentGateway;
use self::invoice::InvoiceService;
use self::pix::PixService;
use self::plan::PlanService;
use self::subscription::SubscriptionService;
use self::usage::UsageLimitService;

/// Every billing service, wired to the same stores and clock.
#[derive(Clone)]
pub struct BillingServices {
    pub usage: UsageLimitService,
    pub invoices: InvoiceService,
    pub pix: PixService,
    pub subscriptions: SubscriptionService,
    pub plans: PlanService,
    pub authorizer: Authorizer,
    pub clock: Arc<dyn Clock>,
}

impl BillingServices {
    pub fn new(
        stores: &Stores,
        gateway: Arc<dyn PaymentGateway>,
        config: &BillingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            usage: UsageLimitService::new(stores.subscriptions.clone(), clock.clone()),
            invoices: InvoiceService::new(
                stores.invoices.clone(),
                stores.subscriptions.clone(),
                config.clone(),
                clock.clone(),
            ),
            pix: PixService::new(stores.invoices.clone(), gateway),
            subscriptions: SubscriptionService::new(
                stores.condominiums.clone(),
                stores.subscriptions.clone(),
                RolloverPolicy::from(config),
                clock.clone(),
            ),
            plans: PlanService::new(stores.plans.clone()),
            authorizer: Authorizer::new(stores.access.clone()),
            clock,
        }
    }
}
