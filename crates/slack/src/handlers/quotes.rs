use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use sirbot_core::{CollaboratorError, HandlerError, IncomingMessage, MessageHandler, RuleError};
use sirbot_stocks::format::{count, fixed, money};
use sirbot_stocks::Quote;

use crate::context::BotContext;
use crate::handlers::compile;
use crate::message::{AttachmentBuilder, ResponseDraft};

const SYMBOL_PATTERN: &str = r"\$\b(?P<symbol>[A-Z.]{1,5})\b";
const UNAVAILABLE: &str = "Unable to retrieve quotes right now.";
const FOOTER: &str = "Data provided for free by <https://iextrading.com/developer|IEX>. \
                      View <https://iextrading.com/api-exhibit-a/|IEX's Terms of Use>.";
const FOOTER_ICON: &str = "https://iextrading.com/apple-touch-icon.png";

fn symbol_in<'a>(pattern: &Regex, message: &'a IncomingMessage) -> Option<&'a str> {
    let captures = pattern.captures(message.text()?)?;
    Some(captures.name("symbol")?.as_str())
}

/// Title, color, change and range fields shared by stock and crypto replies.
fn describe(attachment: &mut AttachmentBuilder, symbol: &str, quote: &Quote) {
    let price = money(quote.latest_price.unwrap_or_default());
    let change = format!(
        "{} ({}%)",
        money(quote.change.unwrap_or_default()),
        fixed(quote.change_percent_points(), 4)
    );
    attachment
        .color(quote.trend().color())
        .title(format!("{} ({}): {price}", quote.symbol, quote.company()))
        .title_link(format!("https://finance.yahoo.com/quote/{symbol}"))
        .short_field("Change", change)
        .short_field("Volume", count(quote.latest_volume.unwrap_or_default()));
}

fn attribute(attachment: &mut AttachmentBuilder, quote: &Quote) {
    attachment.footer(FOOTER, FOOTER_ICON).ts(quote.updated_epoch_secs());
}

fn stock_reply(reply: ResponseDraft, symbol: &str, quote: &Quote, logo: &str) -> ResponseDraft {
    reply.attachment(|attachment| {
        describe(attachment, symbol, quote);
        attachment
            .thumb_url(logo)
            .short_field("Open", money(quote.open.unwrap_or_default()))
            .short_field("Close", money(quote.close.unwrap_or_default()))
            .short_field("Low", money(quote.low.unwrap_or_default()))
            .short_field("High", money(quote.high.unwrap_or_default()));
        attribute(attachment, quote);
    })
}

fn crypto_reply(reply: ResponseDraft, symbol: &str, quote: &Quote) -> ResponseDraft {
    reply.attachment(|attachment| {
        describe(attachment, symbol, quote);
        let latest = quote.latest_time.as_deref().unwrap_or("N/A");
        attachment
            .short_field("Low", money(quote.low.unwrap_or_default()))
            .short_field("High", money(quote.high.unwrap_or_default()))
            .short_field("Latest time of quote", format!("{latest} EST"));
        attribute(attachment, quote);
    })
}

/// `s$AAPL`: book quote and logo for a listed symbol.
pub struct StockQuote {
    symbol: Regex,
}

impl StockQuote {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { symbol: compile("stock_quote", SYMBOL_PATTERN)? })
    }
}

#[async_trait]
impl MessageHandler<BotContext> for StockQuote {
    async fn handle(
        &self,
        message: Arc<IncomingMessage>,
        ctx: Arc<BotContext>,
    ) -> Result<(), HandlerError> {
        let Some(symbol) = symbol_in(&self.symbol, &message) else {
            return Ok(());
        };
        debug!(
            event_name = "handler.quote.stock",
            symbol,
            "fetching stock quote"
        );

        let looked_up = async {
            let quote = ctx.quotes.book_quote(symbol).await?;
            let logo = ctx.quotes.logo(symbol).await?;
            Ok::<_, CollaboratorError>((quote, logo))
        }
        .await;

        let reply = ResponseDraft::reply_to(&message);
        let draft = match looked_up {
            Ok((quote, logo)) => stock_reply(reply, symbol, &quote, &logo),
            Err(error) if error.is_not_found() => {
                reply.text(format!("The symbol `{symbol}` could not be found."))
            }
            Err(error) => {
                warn!(
                    event_name = "handler.quote.failed",
                    symbol,
                    error = %error,
                    "stock quote lookup failed"
                );
                reply.text(UNAVAILABLE)
            }
        };
        ctx.chat.post_message(&draft).await?;
        Ok(())
    }
}

/// `c$BTC`: looked up as `BTCUSDT` in the provider's crypto listing.
pub struct CryptoQuote {
    symbol: Regex,
}

impl CryptoQuote {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { symbol: compile("crypto_quote", SYMBOL_PATTERN)? })
    }
}

#[async_trait]
impl MessageHandler<BotContext> for CryptoQuote {
    async fn handle(
        &self,
        message: Arc<IncomingMessage>,
        ctx: Arc<BotContext>,
    ) -> Result<(), HandlerError> {
        let Some(symbol) = symbol_in(&self.symbol, &message) else {
            return Ok(());
        };
        debug!(
            event_name = "handler.quote.crypto",
            symbol,
            "fetching crypto quote"
        );

        let reply = ResponseDraft::reply_to(&message);
        let pair = format!("{symbol}USDT");
        let draft = match ctx.quotes.list_crypto().await {
            Ok(listing) => match listing.iter().find(|quote| quote.symbol == pair) {
                Some(quote) => crypto_reply(reply, symbol, quote),
                None => reply.text(format!("The crypto symbol `{symbol}` could not be found")),
            },
            Err(error) => {
                warn!(
                    event_name = "handler.quote.failed",
                    symbol,
                    error = %error,
                    "crypto listing failed"
                );
                reply.text(UNAVAILABLE)
            }
        };
        ctx.chat.post_message(&draft).await?;
        Ok(())
    }
}
