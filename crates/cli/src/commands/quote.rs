use archquote_core::pricing::{DeterministicPricingEngine, PricingEngine};
use archquote_core::proposal::format_summary;
use archquote_core::proposal::money::format_brl;

use super::{build_input, load_config, CommandResult, QuoteArgs};

pub fn run(args: QuoteArgs, json_output: bool) -> CommandResult {
    let config = match load_config("quote") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let input = match build_input("quote", args) {
        Ok(input) => input,
        Err(result) => return result,
    };

    let engine = DeterministicPricingEngine::new(config.pricing);
    let result = engine.compute(&input);

    if json_output {
        let message = format!("final price {}", format_brl(result.final_price));
        return CommandResult::with_data("quote", message, &result);
    }

    CommandResult::plain(format_summary(&result).join("\n"))
}
