//! Place Split Order Use Case
//!
//! Fans one order request out into five independent venue orders. Legs are
//! attempted one after another and never compensated: any number of placed
//! legs from one to five is a valid terminal state.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::dto::{LegPlacement, PlaceOrderDto, PlacementOutcome};
use crate::application::ports::{GatewayError, GatewayPort, OpenOrderRequest};
use crate::domain::split_order::{
    GroupIdGenerator, GroupRegistry, LEG_COUNT, LegIndex, LegTag, NewGroup, SplitOrderGroup,
    SymbolSpec, SymbolTable, leg_volumes,
};
use crate::observability::{record_group_created, record_leg_placement, set_groups_tracked};

/// Defaults applied to every placement.
#[derive(Debug, Clone)]
pub struct PlacementSettings {
    /// Identifying marker stamped on every leg.
    pub magic: u64,
    /// Comment prefix when the request has none.
    pub comment_prefix: String,
    /// Deviation when the request has none.
    pub default_deviation: u32,
    /// Total volume when the request has none.
    pub default_lot_size: Decimal,
}

/// Split order placement errors.
#[derive(Debug, thiserror::Error)]
pub enum SplitOrderError {
    /// Rejected before any venue call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No leg was placed; no group was kept.
    #[error("all legs failed: {last_error}")]
    TotalExecutionFailure {
        /// Reason of the last failed leg.
        last_error: String,
    },

    /// Venue failure before placement started.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Use case for fanning an order out into a split order group.
pub struct PlaceSplitOrderUseCase<G>
where
    G: GatewayPort,
{
    gateway: Arc<G>,
    symbols: SymbolTable,
    settings: PlacementSettings,
    ids: Mutex<GroupIdGenerator>,
}

impl<G> PlaceSplitOrderUseCase<G>
where
    G: GatewayPort,
{
    /// Create a new `PlaceSplitOrderUseCase`.
    pub fn new(gateway: Arc<G>, symbols: SymbolTable, settings: PlacementSettings) -> Self {
        Self {
            gateway,
            symbols,
            settings,
            ids: Mutex::new(GroupIdGenerator::new()),
        }
    }

    /// Place the five legs and register the group.
    ///
    /// # Errors
    ///
    /// - `Validation` if the request is rejected up front
    /// - `Gateway` if the market price cannot be read
    /// - `TotalExecutionFailure` if every leg failed
    pub async fn execute(
        &self,
        registry: &mut GroupRegistry,
        request: PlaceOrderDto,
    ) -> Result<PlacementOutcome, SplitOrderError> {
        let spec = self.validate(&request)?;
        let total = request.lot_size.unwrap_or(self.settings.default_lot_size);
        let prefix = request
            .comment
            .as_deref()
            .unwrap_or(&self.settings.comment_prefix);
        let deviation = request.deviation.unwrap_or(self.settings.default_deviation);

        // 1. Downgrade stops the market has already passed
        let quote = self.gateway.quote(&request.symbol).await?;
        let order_kind = request.order_type.resolve(request.price, quote.bid, quote.ask);
        if order_kind != request.order_type {
            tracing::info!(
                symbol = %request.symbol,
                requested = %request.order_type,
                effective = %order_kind,
                bid = %quote.bid,
                ask = %quote.ask,
                "Stop trigger already passed, placing as limit"
            );
        }

        // 2. Split volume, 3. allocate the group id
        let volumes = leg_volumes(total, spec.lot_step);
        let now = Utc::now();
        let group_id = self
            .ids
            .lock()
            .next_id(&request.symbol, request.price, spec.digits, now);

        let mut group = SplitOrderGroup::new(NewGroup {
            id: group_id.clone(),
            symbol: request.symbol.clone(),
            order_kind,
            entry_price: request.price,
            pip_value: spec.pip_value,
            created_at: now,
        });

        // 4. Each leg independently
        let mut legs = Vec::with_capacity(LEG_COUNT);
        let mut last_error = None;
        for index in LegIndex::ALL {
            let volume = volumes[index.slot()];
            let take_profit = group.ladder_take_profit(index);
            let requested_tp = request.tp_levels[index.slot()];
            if requested_tp != take_profit {
                tracing::debug!(
                    group_id = %group_id,
                    leg = %index,
                    requested = %requested_tp,
                    ladder = %take_profit,
                    "Requested take-profit differs from ladder, using ladder"
                );
            }
            group.plan_volume(index, volume);

            let result = if volume.is_zero() {
                record_leg_placement("skipped");
                Err(format!("volume rounds to zero at lot step {}", spec.lot_step))
            } else {
                let tag = LegTag::new(group_id.clone(), index);
                let open = OpenOrderRequest {
                    symbol: request.symbol.clone(),
                    kind: order_kind,
                    volume,
                    price: request.price,
                    stop_loss: request.sl,
                    take_profit,
                    deviation,
                    magic: self.settings.magic,
                    comment: tag.to_comment(prefix),
                    tag: Some(tag),
                };
                self.gateway.open_order(open).await.map_err(|e| e.to_string())
            };

            match result {
                Ok(ticket) => {
                    record_leg_placement("placed");
                    group.attach_leg(index, ticket, volume, take_profit);
                    tracing::debug!(
                        group_id = %group_id,
                        leg = %index,
                        ticket = %ticket,
                        %volume,
                        "Leg placed"
                    );
                    legs.push(LegPlacement {
                        index,
                        ticket: Some(ticket),
                        volume,
                        take_profit,
                        error: None,
                    });
                }
                Err(error) => {
                    if !volume.is_zero() {
                        record_leg_placement("rejected");
                    }
                    tracing::warn!(
                        group_id = %group_id,
                        leg = %index,
                        %error,
                        "Leg placement failed"
                    );
                    last_error = Some(error.clone());
                    legs.push(LegPlacement {
                        index,
                        ticket: None,
                        volume,
                        take_profit,
                        error: Some(error),
                    });
                }
            }
        }

        // 5. Nothing placed: discard
        let Some(ticket) = group.first_ticket() else {
            let last_error = last_error.unwrap_or_else(|| "no leg placed".to_string());
            tracing::warn!(
                group_id = %group_id,
                error = %last_error,
                "Split order failed on every leg"
            );
            return Err(SplitOrderError::TotalExecutionFailure { last_error });
        };

        // 6. Register
        tracing::info!(
            group_id = %group_id,
            symbol = %group.symbol(),
            order_kind = %order_kind,
            placed = group.placed_count(),
            ticket = %ticket,
            "Split order group created"
        );
        registry.insert(group);
        record_group_created();
        set_groups_tracked(registry.len());

        Ok(PlacementOutcome {
            ticket,
            group_id,
            order_kind,
            legs,
        })
    }

    fn validate(&self, request: &PlaceOrderDto) -> Result<&SymbolSpec, SplitOrderError> {
        request
            .symbol
            .validate()
            .map_err(|e| SplitOrderError::Validation(e.to_string()))?;

        let spec = self.symbols.get(&request.symbol).ok_or_else(|| {
            SplitOrderError::Validation(format!("symbol not tradable: {}", request.symbol))
        })?;

        if request.price <= Decimal::ZERO {
            return Err(SplitOrderError::Validation(format!(
                "price must be positive, got {}",
                request.price
            )));
        }
        if request.sl < Decimal::ZERO {
            return Err(SplitOrderError::Validation(format!(
                "stop-loss must not be negative, got {}",
                request.sl
            )));
        }
        if request.tp_levels.len() != LEG_COUNT {
            return Err(SplitOrderError::Validation(format!(
                "expected {LEG_COUNT} take-profit levels, got {}",
                request.tp_levels.len()
            )));
        }

        let total = request.lot_size.unwrap_or(self.settings.default_lot_size);
        if !spec.accepts_volume(total) {
            return Err(SplitOrderError::Validation(format!(
                "volume {total} outside [{}, {}]",
                spec.min_volume, spec.max_volume
            )));
        }

        if let Some(magic) = request.magic_number
            && magic != self.settings.magic
        {
            return Err(SplitOrderError::Validation(format!(
                "magic_number {magic} differs from the engine marker {}",
                self.settings.magic
            )));
        }

        if request.comment.as_deref().is_some_and(|c| c.contains('|')) {
            return Err(SplitOrderError::Validation(
                "comment must not contain '|'".to_string(),
            ));
        }

        Ok(spec)
    }
}
