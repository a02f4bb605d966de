/// Protocol version carried in challenges and required in proofs.
pub const X402_VERSION: u32 = 1;

/// Request header carrying the base64-encoded payment proof.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Network used when neither the route nor the environment names one.
pub const DEFAULT_NETWORK: &str = "avalanche";

/// Public facilitator used when none is configured.
pub const DEFAULT_FACILITATOR_URL: &str = "https://facilitator.ultravioletadao.xyz";

/// Default human-readable purpose of a gated route.
pub const DEFAULT_DESCRIPTION: &str = "Premium endpoint access";

/// Upper bound on a single facilitator verification call.
pub const VERIFY_TIMEOUT_SECS: u64 = 30;

/// Default capacity of the interaction log.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Native USDC contract per supported network.
pub const DEFAULT_USDC: &[(&str, &str)] = &[
    ("avalanche", "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
    ("base", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
    ("ethereum", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
    ("arbitrum", "0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
    ("optimism", "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
    ("polygon", "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
];

/// USDC address for `network`, falling back to the default network's asset.
pub fn default_asset(network: &str) -> &'static str {
    DEFAULT_USDC
        .iter()
        .find(|(name, _)| *name == network)
        .or_else(|| DEFAULT_USDC.iter().find(|(name, _)| *name == DEFAULT_NETWORK))
        .map(|(_, asset)| *asset)
        .unwrap_or_default()
}
