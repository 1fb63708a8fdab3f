// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[tokio::test]
async fn unreachable_endpoint_yields_no_opinion() {
    let oracle = HttpIdleOracle::new("http://127.0.0.1:1", None, Duration::from_millis(200));
    let result = oracle
        .ask(OracleQuestion { model: "test-model".to_string(), recent_output: "foo".to_string(), prompt: "is this idle?" })
        .await;
    assert_eq!(result, None);
}
