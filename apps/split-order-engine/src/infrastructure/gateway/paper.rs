//! Paper trading gateway.
//!
//! An in-memory venue: pending orders, positions, quotes and an account
//! balance. Used by the binary in paper mode and by tests, which drive fills
//! and exits by hand and can inject venue rejections.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;

use crate::application::ports::{
    AccountSnapshot, GatewayError, GatewayPort, MarketFeedPort, OpenOrderRequest, Quote,
    VenueOrder, VenueOrderKind,
};
use crate::domain::shared::{Symbol, Ticket};
use crate::domain::split_order::{Direction, SymbolTable};

const QUOTE_CHANNEL_CAPACITY: usize = 256;
const LEVERAGE: Decimal = dec!(100);

/// Which book a modify call addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    /// A pending order.
    Pending,
    /// An open position.
    Position,
}

/// A recorded modify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyCall {
    /// Ticket addressed.
    pub ticket: Ticket,
    /// Book addressed.
    pub target: ModifyTarget,
    /// New entry price (pending only).
    pub price: Option<Decimal>,
    /// New stop-loss.
    pub stop_loss: Decimal,
    /// New take-profit.
    pub take_profit: Decimal,
}

#[derive(Debug)]
struct PaperState {
    next_ticket: u64,
    pending: BTreeMap<Ticket, VenueOrder>,
    positions: BTreeMap<Ticket, VenueOrder>,
    quotes: HashMap<Symbol, Quote>,
    balance: Decimal,
    open_calls: usize,
    rejected_opens: HashSet<usize>,
    fail_modifies: bool,
    modify_calls: Vec<ModifyCall>,
}

impl PaperState {
    fn allocate_ticket(&mut self) -> Result<Ticket, GatewayError> {
        let ticket = Ticket::from_raw(self.next_ticket).ok_or_else(|| GatewayError::Unavailable {
            message: "ticket sequence exhausted".to_string(),
        })?;
        self.next_ticket += 1;
        Ok(ticket)
    }

    fn exit_price(&self, position: &VenueOrder) -> Decimal {
        self.quotes.get(&position.symbol).map_or(position.price, |quote| {
            match position.kind.direction() {
                Direction::Long => quote.bid,
                Direction::Short => quote.ask,
            }
        })
    }

    fn realize(&mut self, position: &VenueOrder, exit: Decimal) {
        self.balance += profit(position, exit);
    }

    fn fill(&mut self, ticket: Ticket) -> Result<(), GatewayError> {
        let mut order = self
            .pending
            .remove(&ticket)
            .ok_or(GatewayError::NotFound { ticket })?;
        order.kind = VenueOrderKind::position(order.kind.direction());
        order.opened_at = Utc::now();
        self.positions.insert(ticket, order);
        Ok(())
    }

    /// Fill triggered pending orders and close positions whose stop or target was hit.
    fn match_quote(&mut self, quote: &Quote) {
        let triggered: Vec<Ticket> = self
            .pending
            .values()
            .filter(|o| o.symbol == quote.symbol)
            .filter(|o| match o.kind {
                VenueOrderKind::BuyLimit => quote.ask <= o.price,
                VenueOrderKind::BuyStop => quote.ask >= o.price,
                VenueOrderKind::SellLimit => quote.bid >= o.price,
                VenueOrderKind::SellStop => quote.bid <= o.price,
                VenueOrderKind::Buy | VenueOrderKind::Sell => false,
            })
            .map(|o| o.ticket)
            .collect();
        for ticket in triggered {
            if self.fill(ticket).is_ok() {
                tracing::debug!(ticket = %ticket, "Paper order filled");
            }
        }

        let exits: Vec<(Ticket, Decimal)> = self
            .positions
            .values()
            .filter(|p| p.symbol == quote.symbol)
            .filter_map(|p| {
                let (mark, tp_hit, sl_hit) = match p.kind.direction() {
                    Direction::Long => (
                        quote.bid,
                        !p.take_profit.is_zero() && quote.bid >= p.take_profit,
                        !p.stop_loss.is_zero() && quote.bid <= p.stop_loss,
                    ),
                    Direction::Short => (
                        quote.ask,
                        !p.take_profit.is_zero() && quote.ask <= p.take_profit,
                        !p.stop_loss.is_zero() && quote.ask >= p.stop_loss,
                    ),
                };
                (tp_hit || sl_hit).then_some((p.ticket, mark))
            })
            .collect();
        for (ticket, exit) in exits {
            if let Some(position) = self.positions.remove(&ticket) {
                self.realize(&position, exit);
                tracing::debug!(ticket = %ticket, %exit, "Paper position closed");
            }
        }
    }
}

fn profit(position: &VenueOrder, exit: Decimal) -> Decimal {
    position.kind.direction().sign() * (exit - position.price) * position.volume
}

/// In-memory simulated venue.
#[derive(Debug)]
pub struct PaperGateway {
    state: Mutex<PaperState>,
    symbols: SymbolTable,
    updates: broadcast::Sender<Quote>,
    structured_tags: bool,
    auto_match: bool,
}

impl PaperGateway {
    /// Create an empty venue trading the given symbols.
    #[must_use]
    pub fn new(symbols: SymbolTable) -> Self {
        let (updates, _) = broadcast::channel(QUOTE_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(PaperState {
                next_ticket: 1,
                pending: BTreeMap::new(),
                positions: BTreeMap::new(),
                quotes: HashMap::new(),
                balance: Decimal::ZERO,
                open_calls: 0,
                rejected_opens: HashSet::new(),
                fail_modifies: false,
                modify_calls: Vec::new(),
            }),
            symbols,
            updates,
            structured_tags: false,
            auto_match: false,
        }
    }

    /// Set the starting balance.
    #[must_use]
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.state.get_mut().balance = balance;
        self
    }

    /// Keep the structured leg tag next to the comment.
    #[must_use]
    pub fn with_structured_tags(mut self) -> Self {
        self.structured_tags = true;
        self
    }

    /// Fill and close orders automatically when quotes cross their prices.
    #[must_use]
    pub fn with_auto_matching(mut self) -> Self {
        self.auto_match = true;
        self
    }

    /// Publish a quote.
    pub fn set_quote(&self, symbol: impl Into<Symbol>, bid: Decimal, ask: Decimal) {
        let quote = Quote::new(symbol.into(), bid, ask);
        {
            let mut state = self.state.lock();
            state.quotes.insert(quote.symbol.clone(), quote.clone());
            if self.auto_match {
                state.match_quote(&quote);
            }
        }
        // No subscriber is fine.
        let _ = self.updates.send(quote);
    }

    /// Turn a pending order into a position with the same ticket.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket is not pending.
    pub fn fill_pending(&self, ticket: Ticket) -> Result<(), GatewayError> {
        self.state.lock().fill(ticket)
    }

    /// Close a position at its take-profit price.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket is not an open position.
    pub fn hit_take_profit(&self, ticket: Ticket) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        let position = state
            .positions
            .remove(&ticket)
            .ok_or(GatewayError::NotFound { ticket })?;
        let exit = position.take_profit;
        state.realize(&position, exit);
        Ok(())
    }

    /// Place an order directly on the books, bypassing validation.
    ///
    /// Pending kinds land in the pending book, `Buy`/`Sell` in positions.
    pub fn insert_order(&self, order: VenueOrder) {
        let mut state = self.state.lock();
        state.next_ticket = state.next_ticket.max(order.ticket.value() + 1);
        if order.kind.pending_kind().is_some() {
            state.pending.insert(order.ticket, order);
        } else {
            state.positions.insert(order.ticket, order);
        }
    }

    /// Reject upcoming `open_order` calls by position, counted from now.
    pub fn reject_next_opens(&self, calls: impl IntoIterator<Item = usize>) {
        let mut state = self.state.lock();
        let base = state.open_calls;
        state.rejected_opens.extend(calls.into_iter().map(|n| base + n));
    }

    /// Reject every modify while set.
    pub fn fail_modifies(&self, fail: bool) {
        self.state.lock().fail_modifies = fail;
    }

    /// Modify calls received so far, accepted or not.
    #[must_use]
    pub fn modify_calls(&self) -> Vec<ModifyCall> {
        self.state.lock().modify_calls.clone()
    }

    /// Look up a live order or position.
    #[must_use]
    pub fn order(&self, ticket: Ticket) -> Option<VenueOrder> {
        let state = self.state.lock();
        state
            .pending
            .get(&ticket)
            .or_else(|| state.positions.get(&ticket))
            .cloned()
    }

    fn validate_open(&self, request: &OpenOrderRequest) -> Result<(), GatewayError> {
        let reject = |reason: String| Err(GatewayError::Rejected { reason });

        let Some(spec) = self.symbols.get(&request.symbol) else {
            return reject(format!("unknown symbol {}", request.symbol));
        };
        if request.volume <= Decimal::ZERO {
            return reject(format!("invalid volume {}", request.volume));
        }
        if !spec.accepts_volume(request.volume) {
            return reject(format!(
                "volume {} outside [{}, {}]",
                request.volume, spec.min_volume, spec.max_volume
            ));
        }
        if !(request.volume % spec.lot_step).is_zero() {
            return reject(format!(
                "volume {} is not a multiple of {}",
                request.volume, spec.lot_step
            ));
        }
        if request.price <= Decimal::ZERO {
            return reject(format!("invalid price {}", request.price));
        }
        Ok(())
    }
}

#[async_trait]
impl GatewayPort for PaperGateway {
    async fn open_order(&self, request: OpenOrderRequest) -> Result<Ticket, GatewayError> {
        let mut state = self.state.lock();
        let call = state.open_calls;
        state.open_calls += 1;

        if state.rejected_opens.remove(&call) {
            return Err(GatewayError::Rejected {
                reason: "rejected by paper venue".to_string(),
            });
        }
        self.validate_open(&request)?;

        let ticket = state.allocate_ticket()?;
        state.pending.insert(
            ticket,
            VenueOrder {
                ticket,
                symbol: request.symbol,
                kind: request.kind.into(),
                volume: request.volume,
                price: request.price,
                stop_loss: request.stop_loss,
                take_profit: request.take_profit,
                profit: Decimal::ZERO,
                comment: request.comment,
                magic: request.magic,
                tag: request.tag.filter(|_| self.structured_tags),
                opened_at: Utc::now(),
            },
        );
        Ok(ticket)
    }

    async fn modify_pending(
        &self,
        ticket: Ticket,
        price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.modify_calls.push(ModifyCall {
            ticket,
            target: ModifyTarget::Pending,
            price: Some(price),
            stop_loss,
            take_profit,
        });
        if state.fail_modifies {
            return Err(GatewayError::Rejected {
                reason: "modify rejected by paper venue".to_string(),
            });
        }
        let order = state
            .pending
            .get_mut(&ticket)
            .ok_or(GatewayError::NotFound { ticket })?;
        order.price = price;
        order.stop_loss = stop_loss;
        order.take_profit = take_profit;
        Ok(())
    }

    async fn modify_position(
        &self,
        ticket: Ticket,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.modify_calls.push(ModifyCall {
            ticket,
            target: ModifyTarget::Position,
            price: None,
            stop_loss,
            take_profit,
        });
        if state.fail_modifies {
            return Err(GatewayError::Rejected {
                reason: "modify rejected by paper venue".to_string(),
            });
        }
        let position = state
            .positions
            .get_mut(&ticket)
            .ok_or(GatewayError::NotFound { ticket })?;
        position.stop_loss = stop_loss;
        position.take_profit = take_profit;
        Ok(())
    }

    async fn cancel_order(&self, ticket: Ticket) -> Result<(), GatewayError> {
        self.state
            .lock()
            .pending
            .remove(&ticket)
            .map(|_| ())
            .ok_or(GatewayError::NotFound { ticket })
    }

    async fn close_position(&self, ticket: Ticket) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        let position = state
            .positions
            .remove(&ticket)
            .ok_or(GatewayError::NotFound { ticket })?;
        let exit = state.exit_price(&position);
        state.realize(&position, exit);
        Ok(())
    }

    async fn positions(&self) -> Result<Vec<VenueOrder>, GatewayError> {
        let state = self.state.lock();
        Ok(state
            .positions
            .values()
            .map(|position| VenueOrder {
                profit: profit(position, state.exit_price(position)),
                ..position.clone()
            })
            .collect())
    }

    async fn pending_orders(&self) -> Result<Vec<VenueOrder>, GatewayError> {
        Ok(self.state.lock().pending.values().cloned().collect())
    }

    async fn quote(&self, symbol: &Symbol) -> Result<Quote, GatewayError> {
        self.state
            .lock()
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| GatewayError::NoQuote {
                symbol: symbol.clone(),
            })
    }

    async fn account(&self) -> Result<AccountSnapshot, GatewayError> {
        let state = self.state.lock();
        let profit: Decimal = state
            .positions
            .values()
            .map(|p| profit(p, state.exit_price(p)))
            .sum();
        let margin: Decimal = state
            .positions
            .values()
            .map(|p| p.price * p.volume / LEVERAGE)
            .sum();
        let equity = state.balance + profit;

        Ok(AccountSnapshot {
            balance: state.balance,
            equity,
            margin,
            free_margin: equity - margin,
            profit,
        })
    }
}

impl MarketFeedPort for PaperGateway {
    fn market_updates(&self) -> broadcast::Receiver<Quote> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::GroupId;
    use crate::domain::split_order::{LegIndex, LegTag, OrderKind, SymbolSpec};

    fn gateway() -> PaperGateway {
        PaperGateway::new(SymbolTable::new().with(
            "XAUUSD",
            SymbolSpec {
                pip_value: dec!(0.10),
                lot_step: dec!(0.01),
                min_volume: dec!(0.01),
                max_volume: dec!(50),
                digits: 2,
            },
        ))
        .with_balance(dec!(1000))
    }

    fn request(kind: OrderKind, volume: Decimal) -> OpenOrderRequest {
        OpenOrderRequest {
            symbol: Symbol::new("XAUUSD"),
            kind,
            volume,
            price: dec!(4100),
            stop_loss: dec!(4090),
            take_profit: dec!(4110),
            deviation: 3,
            magic: 1,
            comment: "split|GROUP:G|TP:1".to_string(),
            tag: Some(LegTag::new(GroupId::new("G"), LegIndex::TP1)),
        }
    }

    #[tokio::test]
    async fn tickets_are_sequential_from_one() {
        let gateway = gateway();
        let t1 = gateway.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.unwrap();
        let t2 = gateway.open_order(request(OrderKind::BuyLimit, dec!(0.02))).await.unwrap();
        assert_eq!(t1.value(), 1);
        assert_eq!(t2.value(), 2);
    }

    #[tokio::test]
    async fn rejects_bad_volumes() {
        let gateway = gateway();
        for volume in [Decimal::ZERO, dec!(0.015), dec!(100)] {
            let result = gateway.open_order(request(OrderKind::BuyLimit, volume)).await;
            assert!(matches!(result, Err(GatewayError::Rejected { .. })), "{volume}");
        }
    }

    #[tokio::test]
    async fn scripted_rejections_hit_exact_calls() {
        let gateway = gateway();
        gateway.reject_next_opens([1]);
        assert!(gateway.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.is_ok());
        assert!(gateway.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.is_err());
        assert!(gateway.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.is_ok());
    }

    #[tokio::test]
    async fn tag_is_dropped_unless_structured() {
        let plain = gateway();
        let ticket = plain.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.unwrap();
        assert!(plain.order(ticket).unwrap().tag.is_none());

        let structured = gateway().with_structured_tags();
        let ticket = structured.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.unwrap();
        assert!(structured.order(ticket).unwrap().tag.is_some());
    }

    #[tokio::test]
    async fn fill_keeps_ticket_and_take_profit_realizes() {
        let gateway = gateway();
        let ticket = gateway.open_order(request(OrderKind::BuyStop, dec!(1))).await.unwrap();
        gateway.fill_pending(ticket).unwrap();

        let positions = gateway.positions().await.unwrap();
        assert_eq!(positions[0].ticket, ticket);
        assert_eq!(positions[0].kind, VenueOrderKind::Buy);
        assert!(gateway.pending_orders().await.unwrap().is_empty());

        gateway.hit_take_profit(ticket).unwrap();
        assert!(gateway.order(ticket).is_none());
        assert_eq!(gateway.account().await.unwrap().balance, dec!(1010));
    }

    #[tokio::test]
    async fn identical_modify_is_accepted_and_recorded() {
        let gateway = gateway();
        let ticket = gateway.open_order(request(OrderKind::BuyLimit, dec!(0.01))).await.unwrap();
        for _ in 0..2 {
            gateway
                .modify_pending(ticket, dec!(4100), dec!(4090), dec!(4104.5))
                .await
                .unwrap();
        }
        assert_eq!(gateway.modify_calls().len(), 2);
        assert!(matches!(
            gateway.modify_position(ticket, dec!(4090), dec!(4104.5)).await,
            Err(GatewayError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn auto_matching_fills_and_exits() {
        let gateway = gateway().with_auto_matching();
        let ticket = gateway.open_order(request(OrderKind::BuyLimit, dec!(1))).await.unwrap();

        gateway.set_quote("XAUUSD", dec!(4099.8), dec!(4100.0));
        assert!(matches!(
            gateway.order(ticket).map(|o| o.kind),
            Some(VenueOrderKind::Buy)
        ));

        gateway.set_quote("XAUUSD", dec!(4110.0), dec!(4110.2));
        assert!(gateway.order(ticket).is_none());
        assert_eq!(gateway.account().await.unwrap().balance, dec!(1010));
    }

    #[tokio::test]
    async fn quotes_are_published() {
        let gateway = gateway();
        let mut updates = gateway.market_updates();
        gateway.set_quote("XAUUSD", dec!(1), dec!(2));
        let quote = updates.recv().await.unwrap();
        assert_eq!(quote.ask, dec!(2));
        assert_eq!(gateway.quote(&Symbol::new("XAUUSD")).await.unwrap(), quote);
    }
}
