use orderbook_oms::oms::{OmsConfig, OmsError, TickTier};
use std::io::Write;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "engine": {{ "enable_iceberg": true, "iceberg_interval_ms": 5 }},
                "dispatcher": {{ "shards": 4, "max_retries": 2 }},
                "price_bands": {{ "AAA": {{ "floor": 90, "ceiling": 110 }} }},
                "tick_sizes": {{ "AAA": [ {{ "max_price": 100, "step": 1 }}, {{ "max_price": 0, "step": 5 }} ] }}
            }}"#
        )
        .unwrap();

        let config = OmsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.engine.iceberg_interval_ms, 5);
        assert_eq!(config.dispatcher.shards, 4);
        assert_eq!(config.dispatcher.max_retries, 2);
        assert_eq!(config.dispatcher.queue_capacity, 100_000);
        assert_eq!(config.price_bands["AAA"].ceiling, 110);
        assert_eq!(
            config.tick_sizes["AAA"],
            vec![
                TickTier { max_price: 100, step: 1 },
                TickTier { max_price: 0, step: 5 },
            ]
        );
        assert_eq!(config.risk_rules().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OmsConfig::from_file(dir.path().join("absent.json")),
            Err(OmsError::Io(_))
        ));
    }

    #[test]
    fn test_round_trip_through_file() {
        let config = OmsConfig::default()
            .with_price_band("BBB", 1, 1_000)
            .with_tick_sizes("BBB", vec![TickTier { max_price: 0, step: 10 }]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oms.json");
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(OmsConfig::from_file(&path).unwrap(), config);
    }
}
