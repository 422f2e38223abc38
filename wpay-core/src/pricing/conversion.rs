use super::cache::PriceCache;
use super::source::RateSource;
use crate::checkout::CheckoutError;
use crate::money::Money;
use kanau::processor::Processor;
use lazy_static::lazy_static;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use wpay_sdk::objects::{SimplePriceResponse, Stablecoin};

/// Fraction digits of a converted crypto amount.
const CONVERTED_DP: u32 = 6;

lazy_static! {
    static ref PRICE_SOURCE_IDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("ETH", "ethereum"),
        ("BTC", "bitcoin"),
        ("USDC", "usd-coin"),
        ("USDT", "tether"),
        ("DAI", "dai"),
    ]);
}

/// Price-source id of a ticker symbol, case-insensitive.
pub fn price_source_id(symbol: &str) -> Option<&'static str> {
    PRICE_SOURCE_IDS
        .get(symbol.to_ascii_uppercase().as_str())
        .copied()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub original_amount: Money,
    pub converted_amount: Money,
    /// USD per unit of the target asset.
    pub exchange_rate: Decimal,
}

/// Convert a USD amount into `symbol`.
#[derive(Debug, Clone)]
pub struct ConvertUsd {
    pub amount: Money,
    pub symbol: String,
}

/// Where the rate for one requested symbol comes from.
enum Plan {
    Stable(String),
    Priced { symbol: String, id: &'static str },
    Unsupported(String),
}

impl Plan {
    fn for_symbol(symbol: &str) -> Self {
        let symbol = symbol.trim().to_ascii_uppercase();
        if Stablecoin::from_symbol(&symbol).is_some() {
            return Plan::Stable(symbol);
        }
        match price_source_id(&symbol) {
            Some(id) => Plan::Priced { symbol, id },
            None => Plan::Unsupported(symbol),
        }
    }

    fn symbol(&self) -> &str {
        match self {
            Plan::Stable(symbol) | Plan::Unsupported(symbol) => symbol,
            Plan::Priced { symbol, .. } => symbol,
        }
    }
}

/// Stateless apart from the cache; safe to share between tasks.
#[derive(Clone)]
pub struct ConversionService {
    cache: PriceCache,
    source: Arc<dyn RateSource>,
}

impl ConversionService {
    pub fn new(cache: PriceCache, source: Arc<dyn RateSource>) -> Self {
        Self { cache, source }
    }

    pub async fn convert(&self, usd: &Money, symbol: &str) -> Result<ConversionResult, CheckoutError> {
        ensure_usd(usd)?;
        let plan = Plan::for_symbol(symbol);
        let rates = match &plan {
            Plan::Priced { id, .. } => Some(self.rates_for(&[id.to_string()]).await?),
            _ => None,
        };
        resolve(usd, &plan, rates.as_ref())
    }

    /// Convert one USD amount into several assets.
    ///
    /// All priced symbols share a single rate lookup. Results come back in
    /// request order; one unsupported symbol does not fail the others.
    pub async fn convert_many<S: AsRef<str>>(
        &self,
        usd: &Money,
        symbols: &[S],
    ) -> Vec<(String, Result<ConversionResult, CheckoutError>)> {
        let plans: Vec<Plan> = symbols
            .iter()
            .map(|s| Plan::for_symbol(s.as_ref()))
            .collect();

        if let Err(e) = ensure_usd(usd) {
            return plans
                .iter()
                .map(|p| (p.symbol().to_string(), Err(e.clone())))
                .collect();
        }

        let mut ids: Vec<String> = plans
            .iter()
            .filter_map(|p| match p {
                Plan::Priced { id, .. } => Some(id.to_string()),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let rates = if ids.is_empty() {
            Ok(None)
        } else {
            self.rates_for(&ids).await.map(Some)
        };

        plans
            .iter()
            .map(|plan| {
                let result = match (&rates, plan) {
                    (Err(e), Plan::Priced { .. }) => Err(e.clone()),
                    (Ok(rates), _) => resolve(usd, plan, rates.as_ref()),
                    (Err(_), _) => resolve(usd, plan, None),
                };
                (plan.symbol().to_string(), result)
            })
            .collect()
    }

    async fn rates_for(&self, ids: &[String]) -> Result<SimplePriceResponse, CheckoutError> {
        if let Some(rates) = self.cache.get(ids).await {
            return Ok(rates);
        }
        let rates = self
            .source
            .fetch_usd_prices(ids)
            .await
            .map_err(|e| CheckoutError::RateUnavailable(e.to_string()))?;
        self.cache.put(ids, &rates).await;
        Ok(rates)
    }
}

fn ensure_usd(usd: &Money) -> Result<(), CheckoutError> {
    if usd.is_usd() {
        Ok(())
    } else {
        Err(CheckoutError::InvalidAmount(format!(
            "expected a USD amount, got {}",
            usd.currency()
        )))
    }
}

fn resolve(
    usd: &Money,
    plan: &Plan,
    rates: Option<&SimplePriceResponse>,
) -> Result<ConversionResult, CheckoutError> {
    let (symbol, id) = match plan {
        Plan::Unsupported(symbol) => return Err(CheckoutError::UnsupportedAsset(symbol.clone())),
        Plan::Stable(symbol) => {
            return Ok(ConversionResult {
                original_amount: usd.clone(),
                converted_amount: converted(usd.amount(), symbol)?,
                exchange_rate: Decimal::ONE,
            });
        }
        Plan::Priced { symbol, id } => (symbol, *id),
    };

    let quote = rates
        .and_then(|r| r.get(id))
        .ok_or_else(|| CheckoutError::RateUnavailable(format!("no USD price for {id}")))?;
    let rate = Decimal::from_f64(quote.usd)
        .filter(|r| r.is_sign_positive() && !r.is_zero())
        .ok_or_else(|| {
            CheckoutError::RateUnavailable(format!("invalid USD price for {id}: {}", quote.usd))
        })?;
    let amount = usd
        .amount()
        .checked_div(rate)
        .ok_or_else(|| CheckoutError::RateUnavailable(format!("rate for {id} out of range")))?
        .round_dp_with_strategy(CONVERTED_DP, RoundingStrategy::MidpointAwayFromZero);

    debug!(symbol = %symbol, rate = %rate, amount = %amount, "Converted USD amount");
    Ok(ConversionResult {
        original_amount: usd.clone(),
        converted_amount: converted(amount, symbol)?,
        exchange_rate: rate,
    })
}

fn converted(amount: Decimal, symbol: &str) -> Result<Money, CheckoutError> {
    Money::new(amount, symbol).map_err(|e| CheckoutError::InvalidAmount(e.to_string()))
}

impl Processor<ConvertUsd> for ConversionService {
    type Output = ConversionResult;
    type Error = CheckoutError;

    #[tracing::instrument(skip_all, err, fields(symbol = %input.symbol), name = "ConvertUsd")]
    async fn process(&self, input: ConvertUsd) -> Result<ConversionResult, CheckoutError> {
        let result = self.convert(&input.amount, &input.symbol).await?;
        info!(
            usd = %result.original_amount.amount(),
            converted = %result.converted_amount,
            "Quoted checkout amount"
        );
        Ok(result)
    }
}
