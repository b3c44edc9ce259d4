use clap::Parser;

// CLI argument structure - every knob also reads from the environment,
// which is how the deployed gateway is actually configured
#[derive(Parser, Debug, Clone)]
#[command(name = "wa-gateway")]
#[command(about = "Authenticating, rate-limited proxy for the WhatsApp Graph API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8787)]
    pub port: u16,

    // Base URL of the Graph API (overridable so tests can point at a stub)
    #[arg(long, env = "GRAPH_BASE_URL", default_value = "https://graph.facebook.com")]
    pub graph_base_url: String,

    // Upstream access token; absence only matters when an operation needs it
    #[arg(long, env = "WHATSAPP_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    // WhatsApp Business Account id, required by the template routes
    #[arg(long, env = "WHATSAPP_BUSINESS_ACCOUNT_ID")]
    pub waba_id: Option<String>,

    // Phone number id, required by /send
    #[arg(long, env = "WHATSAPP_PHONE_NUMBER_ID")]
    pub phone_number_id: Option<String>,

    // Shared secret callers must present in x-api-key; unset fails closed
    #[arg(long, env = "API_SECRET_KEY")]
    pub api_secret: Option<String>,

    // Permitted cross-origin value ("*" allows any origin)
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "*")]
    pub allowed_origin: String,

    // Rate limit window in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 60)]
    pub rate_max_requests: u32,

    // Template language used when the caller doesn't supply one
    #[arg(long, env = "DEFAULT_TEMPLATE_LANGUAGE", default_value = "en_US")]
    pub default_language: String,
}
