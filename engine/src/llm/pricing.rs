//! Static pricing table keyed by (provider, model), USD per 1M tokens
//! (§4.1 cost computation). Exact decimal arithmetic via `rust_decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_million: Decimal,
    pub output_per_million: Decimal,
}

/// Returns pricing for a (provider, model) pair, or a conservative default
/// when the model isn't in the table (new/unlisted models still get a cost
/// estimate rather than a hard failure).
pub fn pricing_for(provider: &str, model: &str) -> ModelPricing {
    match (provider, model) {
        ("openai", "gpt-4o") => ModelPricing { input_per_million: dec!(2.50), output_per_million: dec!(10.00) },
        ("openai", "gpt-4o-mini") => ModelPricing { input_per_million: dec!(0.15), output_per_million: dec!(0.60) },
        ("openai", "o1") => ModelPricing { input_per_million: dec!(15.00), output_per_million: dec!(60.00) },
        ("anthropic", "claude-3-5-sonnet-20241022") | ("anthropic", "claude-3-5-sonnet-latest") => {
            ModelPricing { input_per_million: dec!(3.00), output_per_million: dec!(15.00) }
        }
        ("anthropic", "claude-3-5-haiku-20241022") | ("anthropic", "claude-3-5-haiku-latest") => {
            ModelPricing { input_per_million: dec!(0.80), output_per_million: dec!(4.00) }
        }
        ("anthropic", "claude-3-opus-20240229") => ModelPricing { input_per_million: dec!(15.00), output_per_million: dec!(75.00) },
        ("perplexity", "sonar") => ModelPricing { input_per_million: dec!(1.00), output_per_million: dec!(1.00) },
        ("perplexity", "sonar-pro") => ModelPricing { input_per_million: dec!(3.00), output_per_million: dec!(15.00) },
        _ => ModelPricing { input_per_million: dec!(1.00), output_per_million: dec!(2.00) },
    }
}

/// Exact decimal cost for a call, given token counts.
pub fn compute_cost(pricing: ModelPricing, input_tokens: u32, output_tokens: u32) -> Decimal {
    let million = Decimal::from(1_000_000u32);
    let input_cost = (Decimal::from(input_tokens) * pricing.input_per_million) / million;
    let output_cost = (Decimal::from(output_tokens) * pricing.output_per_million) / million;
    input_cost + output_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a known model's cost is computed exactly, not as a
    /// floating-point approximation.
    #[test]
    fn compute_cost_is_exact_for_known_model() {
        let pricing = pricing_for("openai", "gpt-4o-mini");
        let cost = compute_cost(pricing, 1_000, 500);
        assert_eq!(cost, dec!(0.15) * dec!(1000) / dec!(1000000) + dec!(0.60) * dec!(500) / dec!(1000000));
        assert!(cost >= Decimal::ZERO);
    }

    #[test]
    fn pricing_for_unknown_model_falls_back_to_default() {
        let pricing = pricing_for("openai", "some-future-model");
        assert_eq!(pricing.input_per_million, dec!(1.00));
    }
}
