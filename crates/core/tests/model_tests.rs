// ═══════════════════════════════════════════════════════════════════
// Model Tests — RawHolding, MatchedHolding, FundRecord, FundHistory,
// FundDetails, Portfolio, Settings
// ═══════════════════════════════════════════════════════════════════

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use holdings_reconciler_core::errors::CoreError;
use holdings_reconciler_core::models::fund::{
    classify_scheme_name, FundCategory, FundDetails, FundHistory, FundMeta, FundRecord, NavPoint,
};
use holdings_reconciler_core::models::holding::{MatchedHolding, RawHolding};
use holdings_reconciler_core::models::portfolio::Portfolio;
use holdings_reconciler_core::models::settings::{
    CacheConfig, MatcherConfig, Settings, MAX_CACHE_AGE_SECS,
};

fn raw(name: &str) -> RawHolding {
    RawHolding {
        scheme_name: name.into(),
        amc_name: "HDFC Mutual Fund".into(),
        category: "Equity".into(),
        sub_category: "Flexi Cap".into(),
        folio_number: "123/45".into(),
        source: "CAMS".into(),
        units: 150.25,
        invested_value: 20000.0,
        current_value: 25000.0,
        returns: 5000.0,
        xirr: 14.0,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn meta(code: &str) -> FundMeta {
    FundMeta {
        fund_house: "Axis Mutual Fund".into(),
        scheme_type: "Open Ended Schemes".into(),
        scheme_category: "Equity Scheme - Large Cap Fund".into(),
        scheme_code: code.into(),
        scheme_name: "Axis Bluechip Fund - Direct Plan - Growth".into(),
    }
}

// ═══════════════════════════════════════════════════════════════════
// RawHolding
// ═══════════════════════════════════════════════════════════════════

mod raw_holding {
    use super::*;

    #[test]
    fn valid_holding_passes() {
        assert!(raw("HDFC Flexi Cap Fund").validate().is_ok());
    }

    #[test]
    fn zero_units_are_allowed() {
        let mut h = raw("Redeemed Fund");
        h.units = 0.0;
        assert!(h.validate().is_ok());
    }

    #[test]
    fn negative_returns_are_allowed() {
        let mut h = raw("Losing Fund");
        h.current_value = 15000.0;
        h.returns = -5000.0;
        h.xirr = -8.5;
        assert!(h.validate().is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut h = raw("   ");
        assert!(matches!(h.validate(), Err(CoreError::ValidationError(_))));
        h.scheme_name = "Fund".into();
        h.amc_name = String::new();
        assert!(matches!(h.validate(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn negative_units_are_rejected() {
        let mut h = raw("Fund");
        h.units = -1.0;
        assert!(matches!(h.validate(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let mut h = raw("Fund");
        h.current_value = f64::NAN;
        assert!(h.validate().is_err());
        let mut h = raw("Fund");
        h.xirr = f64::INFINITY;
        assert!(h.validate().is_err());
    }

    #[test]
    fn returns_percentage() {
        assert_eq!(raw("Fund").returns_percentage(), 25.0);
        let mut h = raw("Fund");
        h.invested_value = 0.0;
        assert_eq!(h.returns_percentage(), 0.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// MatchedHolding
// ═══════════════════════════════════════════════════════════════════

mod matched_holding {
    use super::*;

    #[test]
    fn unmatched_has_no_code() {
        let h = MatchedHolding::unmatched(raw("Fund"));
        assert!(!h.is_matched());
        assert_eq!(h.match_score, None);
    }

    #[test]
    fn with_match_keeps_identity() {
        let h = MatchedHolding::unmatched(raw("Fund"));
        let matched = h.with_match(Some("118955".into()), Some(0.92));
        assert_eq!(matched.id, h.id);
        assert_eq!(matched.holding, h.holding);
        assert!(matched.is_matched());

        let cleared = matched.with_match(None, None);
        assert_eq!(cleared.id, h.id);
        assert!(!cleared.is_matched());
    }

    #[test]
    fn unmatched_ids_are_unique() {
        let a = MatchedHolding::unmatched(raw("Fund"));
        let b = MatchedHolding::unmatched(raw("Fund"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_flat() {
        let h = MatchedHolding::unmatched(raw("Fund")).with_match(Some("1".into()), Some(1.0));
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["scheme_name"], "Fund");
        assert_eq!(json["matched_scheme_code"], "1");
        assert!(json.get("holding").is_none());

        let back: MatchedHolding = serde_json::from_value(json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn missing_id_and_score_get_defaults() {
        let json = serde_json::json!({
            "scheme_name": "Old Record Fund",
            "amc_name": "Some AMC",
            "category": "Debt",
            "sub_category": "Liquid",
            "folio_number": "9",
            "source": "KFintech",
            "units": 1.0,
            "invested_value": 100.0,
            "current_value": 101.0,
            "returns": 1.0,
            "xirr": 6.5,
            "matched_scheme_code": null
        });
        let h: MatchedHolding = serde_json::from_value(json).unwrap();
        assert_ne!(h.id, Uuid::nil());
        assert_eq!(h.match_score, None);
        assert!(!h.is_matched());
    }
}

// ═══════════════════════════════════════════════════════════════════
// FundRecord
// ═══════════════════════════════════════════════════════════════════

mod fund_record {
    use super::*;

    #[test]
    fn fund_house_is_first_token() {
        assert_eq!(FundRecord::new("1", "Axis Bluechip Fund").fund_house(), "Axis");
        assert_eq!(FundRecord::new("1", "   ").fund_house(), "");
    }

    #[test]
    fn plan_flags() {
        let growth = FundRecord::new("1", "HDFC Top 100 Fund - Direct Plan - Growth Option");
        assert!(growth.is_growth_plan());
        assert!(!growth.is_dividend_plan());

        let idcw = FundRecord::new("2", "HDFC Top 100 Fund - IDCW Option");
        assert!(idcw.is_dividend_plan());
        assert!(!idcw.is_growth_plan());

        let dividend = FundRecord::new("3", "Old Fund - Dividend Payout");
        assert!(dividend.is_dividend_plan());
    }

    #[test]
    fn category_checks_hybrid_before_debt_and_equity() {
        assert_eq!(
            FundRecord::new("1", "SBI Equity Hybrid Fund").category(),
            FundCategory::Hybrid
        );
        assert_eq!(
            classify_scheme_name("ICICI Prudential Equity & Debt Balanced Advantage"),
            FundCategory::Hybrid
        );
        assert_eq!(classify_scheme_name("HDFC Liquid Fund"), FundCategory::Debt);
        assert_eq!(
            classify_scheme_name("Aditya Birla Sun Life Corporate Bond Fund"),
            FundCategory::Debt
        );
        assert_eq!(classify_scheme_name("Axis Bluechip Fund"), FundCategory::Equity);
        assert_eq!(
            classify_scheme_name("Parag Parikh Flexi Cap Fund"),
            FundCategory::Equity
        );
        assert_eq!(classify_scheme_name("Kotak Gold ETF"), FundCategory::Other);
    }

    #[test]
    fn category_display() {
        assert_eq!(FundCategory::Hybrid.to_string(), "Hybrid");
        assert_eq!(FundCategory::Other.to_string(), "Other");
    }

    #[test]
    fn numeric_scheme_code_becomes_string() {
        let f: FundRecord =
            serde_json::from_str(r#"{"schemeCode": 100027, "schemeName": "Grindlays Super Saver"}"#)
                .unwrap();
        assert_eq!(f.scheme_code, "100027");
        assert_eq!(f.isin_growth, None);
    }

    #[test]
    fn string_scheme_code_is_trimmed() {
        let f: FundRecord = serde_json::from_str(
            r#"{"schemeCode": " 119551 ", "schemeName": "Aditya Birla", "isinGrowth": "INF209KA12Z1", "isinDivReinvestment": null}"#,
        )
        .unwrap();
        assert_eq!(f.scheme_code, "119551");
        assert_eq!(f.isin_growth.as_deref(), Some("INF209KA12Z1"));
        assert_eq!(f.isin_div_reinvestment, None);
    }

    #[test]
    fn invalid_scheme_codes_are_rejected() {
        for code in [r#"1.5"#, r#"true"#, r#""""#, r#""  ""#, r#"null"#] {
            let json = format!(r#"{{"schemeCode": {code}, "schemeName": "X"}}"#);
            assert!(
                serde_json::from_str::<FundRecord>(&json).is_err(),
                "accepted scheme code {code}"
            );
        }
    }

    #[test]
    fn serializes_code_as_string() {
        let json = serde_json::to_value(FundRecord::new("120503", "Axis ELSS")).unwrap();
        assert_eq!(json["schemeCode"], "120503");
        assert_eq!(json["schemeName"], "Axis ELSS");
    }
}

// ═══════════════════════════════════════════════════════════════════
// FundHistory & FundDetails
// ═══════════════════════════════════════════════════════════════════

mod fund_history {
    use super::*;

    fn history() -> FundHistory {
        FundHistory {
            meta: meta("120465"),
            data: vec![
                NavPoint { date: date(2025, 3, 28), nav: 60.0 },
                NavPoint { date: date(2025, 3, 27), nav: 59.0 },
                NavPoint { date: date(2024, 3, 27), nav: 50.0 },
                NavPoint { date: date(2024, 3, 20), nav: 48.0 },
            ],
        }
    }

    #[test]
    fn latest_is_first() {
        assert_eq!(history().latest().unwrap().nav, 60.0);
    }

    #[test]
    fn nav_on_or_before() {
        let h = history();
        assert_eq!(h.nav_on_or_before(date(2025, 3, 28)).unwrap().nav, 60.0);
        assert_eq!(h.nav_on_or_before(date(2024, 12, 31)).unwrap().nav, 50.0);
        assert!(h.nav_on_or_before(date(2020, 1, 1)).is_none());
    }

    #[test]
    fn details_from_history() {
        let d = FundDetails::from_history(history());
        assert_eq!(d.scheme_code, "120465");
        assert_eq!(d.fund_house, "Axis Mutual Fund");
        assert_eq!(d.latest_nav.as_ref().unwrap().nav, 60.0);
        assert_eq!(d.previous_nav.as_ref().unwrap().nav, 59.0);
        assert!((d.day_change.unwrap() - 1.0).abs() < 1e-9);
        assert!((d.day_change_pct.unwrap() - 100.0 / 59.0).abs() < 1e-9);
        // 2025-03-28 minus 365 days is 2024-03-28; the NAV on or before is 50.
        assert!((d.one_year_return_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(d.history.len(), 4);
    }

    #[test]
    fn details_with_short_history() {
        let d = FundDetails::from_history(FundHistory {
            meta: meta("1"),
            data: vec![NavPoint { date: date(2025, 1, 2), nav: 10.0 }],
        });
        assert!(d.previous_nav.is_none());
        assert!(d.day_change.is_none());
        assert!(d.one_year_return_pct.is_none());
    }

    #[test]
    fn details_with_no_history() {
        let d = FundDetails::from_history(FundHistory {
            meta: meta("1"),
            data: vec![],
        });
        assert!(d.latest_nav.is_none());
        assert!(d.history.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio
// ═══════════════════════════════════════════════════════════════════

mod portfolio {
    use super::*;

    #[test]
    fn summary_derived_on_construction() {
        let mut second = raw("Second Fund");
        second.invested_value = 10000.0;
        second.current_value = 9000.0;
        second.returns = -1000.0;
        second.xirr = -5.0;
        let p = Portfolio::new(
            vec![
                MatchedHolding::unmatched(raw("First Fund")),
                MatchedHolding::unmatched(second),
            ],
            Utc::now(),
        );
        let s = p.summary();
        assert_eq!(s.holdings_count, 2);
        assert_eq!(s.total_investments, 30000.0);
        assert_eq!(s.current_portfolio_value, 34000.0);
        assert_eq!(s.total_returns, 4000.0);
        assert!((s.overall_xirr - 7.666666666666667).abs() < 1e-9);
    }

    #[test]
    fn lookups() {
        let a = MatchedHolding::unmatched(raw("A")).with_match(Some("1".into()), Some(1.0));
        let b = MatchedHolding::unmatched(raw("B"));
        let p = Portfolio::new(vec![a.clone(), b.clone()], Utc::now());

        assert!(!p.is_empty());
        assert_eq!(p.get_holding(b.id), Some(&b));
        assert_eq!(p.get_holding(Uuid::new_v4()), None);
        assert_eq!(p.matched_count(), 1);
        assert_eq!(p.into_holdings(), vec![a, b]);
    }

    #[test]
    fn empty_portfolio() {
        let p = Portfolio::new(vec![], Utc::now());
        assert!(p.is_empty());
        assert_eq!(p.summary().total_investments, 0.0);
        assert_eq!(p.summary().returns_percentage, 0.0);
    }

    #[test]
    fn deserialization_recomputes_summary() {
        let p = Portfolio::new(
            vec![MatchedHolding::unmatched(raw("A"))],
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        let mut json = serde_json::to_value(&p).unwrap();
        json["summary"]["current_portfolio_value"] = serde_json::json!(1.0);
        json["summary"]["holdings_count"] = serde_json::json!(99);

        let back: Portfolio = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.summary().holdings_count, 1);
    }

    #[test]
    fn summary_field_is_optional_when_loading() {
        let p = Portfolio::new(vec![MatchedHolding::unmatched(raw("A"))], Utc::now());
        let mut json = serde_json::to_value(&p).unwrap();
        json.as_object_mut().unwrap().remove("summary");

        let back: Portfolio = serde_json::from_value(json).unwrap();
        assert_eq!(back.summary().total_investments, 20000.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.matcher.acceptance_threshold, 0.7);
        assert_eq!(s.matcher.amc_weight, 0.3);
        assert_eq!(s.matcher.token_weight, 0.5);
        assert_eq!(s.matcher.plan_weight, 0.2);
        assert_eq!(s.cache.namespace, "fund_cache_");
        assert_eq!(s.cache.default_max_age(), chrono::Duration::hours(24));
        assert_eq!(s.cache.detail_max_age(), chrono::Duration::hours(4));
        assert_eq!(s.registry_base_url, "https://api.mfapi.in");
        assert_eq!(s.request_timeout_secs, 30);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let s = Settings::from_json(r#"{"matcher": {"acceptance_threshold": 0.8}}"#).unwrap();
        assert_eq!(s.matcher.acceptance_threshold, 0.8);
        assert_eq!(s.matcher.token_weight, 0.5);
        assert_eq!(s.cache.namespace, "fund_cache_");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let err = Settings::from_json(r#"{"matcher": {"amc_weight": 1.5}}"#).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Settings::from_json("{matcher").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn matcher_config_validate() {
        assert!(MatcherConfig::default().validate().is_ok());
        let bad = MatcherConfig {
            acceptance_threshold: -0.1,
            ..MatcherConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn cache_window_beyond_chrono_range_is_rejected() {
        let json = format!(r#"{{"cache": {{"default_max_age_secs": {}}}}}"#, i64::MAX);
        let err = Settings::from_json(&json).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn negative_cache_window_is_rejected() {
        let err = Settings::from_json(r#"{"cache": {"detail_max_age_secs": -5}}"#).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn cache_window_bounds() {
        let mut config = CacheConfig {
            default_max_age_secs: 0,
            detail_max_age_secs: MAX_CACHE_AGE_SECS,
            ..CacheConfig::default()
        };
        assert!(config.validate().is_ok());
        config.detail_max_age_secs = MAX_CACHE_AGE_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unvalidated_window_converts_without_panicking() {
        let config = CacheConfig {
            default_max_age_secs: i64::MAX,
            detail_max_age_secs: -5,
            ..CacheConfig::default()
        };
        assert_eq!(
            config.default_max_age(),
            chrono::Duration::seconds(MAX_CACHE_AGE_SECS)
        );
        assert_eq!(config.detail_max_age(), chrono::Duration::zero());
    }
}
