use std::net::SocketAddr;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Fixed seed for serve directions. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
    pub command_capacity: usize,
    pub broadcast_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            rng_seed: None,
            command_capacity: 256,
            broadcast_capacity: 64,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `LISTEN_ADDR`, `PORT` and `RNG_SEED`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| format!("PORT must be a port number, got {:?}", port))?;
            config.listen_addr = format!("0.0.0.0:{}", port);
        }

        if let Some(seed) = lookup("RNG_SEED") {
            let seed: u64 = seed
                .parse()
                .map_err(|_| format!("RNG_SEED must be an unsigned integer, got {:?}", seed))?;
            config.rng_seed = Some(seed);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "listen_addr must be host:port, got {:?}",
                self.listen_addr
            ));
        }
        if self.command_capacity == 0 {
            return Err("command_capacity must be > 0".to_string());
        }
        if self.broadcast_capacity == 0 {
            return Err("broadcast_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_server_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr, "0.0.0.0:3001");
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn port_overrides_default_port() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn listen_addr_wins_over_port() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn rng_seed_is_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[("RNG_SEED", "42")])).unwrap();
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("RNG_SEED", "-1")])).is_err());
    }

    #[test]
    fn unparsable_listen_addr_invalid() {
        let config = ServerConfig {
            listen_addr: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_capacity_invalid() {
        let config = ServerConfig {
            broadcast_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
