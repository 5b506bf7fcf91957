//! # 订阅状态对账
//!
//! 把账单事件转换成对用户订阅字段的覆盖写。每个事件只由自身载荷决定写什么，
//! 从不读取当前状态，因此同一事件重复投递得到的结果相同。

use chrono::{NaiveDateTime, Utc};
use entity::users;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::fmt;
use std::sync::Arc;

use super::tiers::Tier;
use super::webhook::BillingEvent;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 写入目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchTarget {
    UserId(i32),
    SubscriptionId(String),
}

/// 对用户订阅字段的覆盖写；`None` 表示该列不动
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub tier: Option<Tier>,
    pub status: Option<String>,
    pub subscription_id: Option<Option<String>>,
    pub ends_at: Option<Option<NaiveDateTime>>,
    pub customer_id: Option<String>,
}

/// 事件的处理计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    Apply {
        target: PatchTarget,
        patch: SubscriptionPatch,
    },
    Skip {
        reason: &'static str,
    },
    Ignore,
}

/// 对账结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { rows: u64 },
    Skipped { reason: String },
    Ignored { event_type: String },
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { rows } => write!(f, "applied ({rows} rows)"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Ignored { event_type } => write!(f, "ignored: {event_type}"),
        }
    }
}

/// 纯函数：事件 -> 计划
#[must_use]
pub fn plan(event: &BillingEvent) -> ReconcilePlan {
    match event {
        BillingEvent::CheckoutCompleted {
            user_id,
            tier,
            subscription_id,
            customer_id,
        } => {
            let Some(user_id) = user_id else {
                return ReconcilePlan::Skip {
                    reason: "checkout session has no userId",
                };
            };
            let Some(tier) = tier else {
                return ReconcilePlan::Skip {
                    reason: "checkout session has no tier",
                };
            };
            let Some(subscription_id) = subscription_id else {
                return ReconcilePlan::Skip {
                    reason: "checkout session has no subscription",
                };
            };
            ReconcilePlan::Apply {
                target: PatchTarget::UserId(*user_id),
                patch: SubscriptionPatch {
                    tier: Some(Tier::from_name_lenient(tier)),
                    status: Some("active".to_string()),
                    subscription_id: Some(Some(subscription_id.clone())),
                    customer_id: customer_id.clone(),
                    ..SubscriptionPatch::default()
                },
            }
        }
        BillingEvent::SubscriptionUpdated {
            user_id,
            status,
            cancel_at,
        } => {
            let Some(user_id) = user_id else {
                return ReconcilePlan::Skip {
                    reason: "subscription has no userId metadata",
                };
            };
            let Some(status) = status else {
                return ReconcilePlan::Skip {
                    reason: "subscription has no status",
                };
            };
            ReconcilePlan::Apply {
                target: PatchTarget::UserId(*user_id),
                patch: SubscriptionPatch {
                    status: Some(status.clone()),
                    ends_at: Some(*cancel_at),
                    ..SubscriptionPatch::default()
                },
            }
        }
        BillingEvent::SubscriptionDeleted { user_id } => {
            let Some(user_id) = user_id else {
                return ReconcilePlan::Skip {
                    reason: "subscription has no userId metadata",
                };
            };
            ReconcilePlan::Apply {
                target: PatchTarget::UserId(*user_id),
                patch: SubscriptionPatch {
                    tier: Some(Tier::Free),
                    status: Some("canceled".to_string()),
                    subscription_id: Some(None),
                    ..SubscriptionPatch::default()
                },
            }
        }
        BillingEvent::InvoicePaymentFailed { subscription_id } => {
            let Some(subscription_id) = subscription_id else {
                return ReconcilePlan::Skip {
                    reason: "invoice has no subscription",
                };
            };
            ReconcilePlan::Apply {
                target: PatchTarget::SubscriptionId(subscription_id.clone()),
                patch: SubscriptionPatch {
                    status: Some("past_due".to_string()),
                    ..SubscriptionPatch::default()
                },
            }
        }
        BillingEvent::Unhandled { .. } => ReconcilePlan::Ignore,
    }
}

/// 订阅对账器
pub struct SubscriptionReconciler {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionReconciler {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 应用事件。字段缺失的事件记录日志后跳过；数据库错误向上返回。
    pub async fn apply(&self, event: &BillingEvent, request_id: &str) -> Result<ReconcileOutcome> {
        let event_type = event.event_type().to_string();

        match plan(event) {
            ReconcilePlan::Ignore => {
                ldebug!(
                    request_id,
                    LogStage::Reconcile,
                    LogComponent::Subscription,
                    "ignore_event",
                    &format!("Ignoring unhandled billing event {event_type}")
                );
                Ok(ReconcileOutcome::Ignored { event_type })
            }
            ReconcilePlan::Skip { reason } => {
                lwarn!(
                    request_id,
                    LogStage::Reconcile,
                    LogComponent::Subscription,
                    "skip_event",
                    &format!("Skipping {event_type}: {reason}"),
                    event_type = %event_type
                );
                Ok(ReconcileOutcome::Skipped {
                    reason: reason.to_string(),
                })
            }
            ReconcilePlan::Apply { target, patch } => {
                let rows = self.write_patch(&target, &patch).await?;
                if rows == 0 {
                    lwarn!(
                        request_id,
                        LogStage::Reconcile,
                        LogComponent::Subscription,
                        "no_matching_user",
                        &format!("{event_type} matched no user for {target:?}")
                    );
                } else {
                    linfo!(
                        request_id,
                        LogStage::Reconcile,
                        LogComponent::Subscription,
                        "apply_event",
                        &format!("Applied {event_type} to {target:?}"),
                        tier = ?patch.tier,
                        status = ?patch.status
                    );
                }
                Ok(ReconcileOutcome::Applied { rows })
            }
        }
    }

    async fn write_patch(&self, target: &PatchTarget, patch: &SubscriptionPatch) -> Result<u64> {
        let mut update = users::Entity::update_many()
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()));

        if let Some(tier) = patch.tier {
            update = update.col_expr(users::Column::SubscriptionTier, Expr::value(tier.as_str()));
        }
        if let Some(status) = &patch.status {
            update = update.col_expr(users::Column::SubscriptionStatus, Expr::value(status.clone()));
        }
        if let Some(subscription_id) = &patch.subscription_id {
            update = update.col_expr(
                users::Column::StripeSubscriptionId,
                Expr::value(subscription_id.clone()),
            );
        }
        if let Some(ends_at) = patch.ends_at {
            update = update.col_expr(users::Column::SubscriptionEndsAt, Expr::value(ends_at));
        }
        if let Some(customer_id) = &patch.customer_id {
            update = update.col_expr(
                users::Column::StripeCustomerId,
                Expr::value(customer_id.clone()),
            );
        }

        update = match target {
            PatchTarget::UserId(id) => update.filter(users::Column::Id.eq(*id)),
            PatchTarget::SubscriptionId(subscription_id) => {
                update.filter(users::Column::StripeSubscriptionId.eq(subscription_id.as_str()))
            }
        };

        let result = update.exec(self.db.as_ref()).await?;
        Ok(result.rows_affected)
    }
}
