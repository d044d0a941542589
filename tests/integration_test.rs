use music_partner_bot::models::ApiReply;
use music_partner_bot::orchestrator::EXTRA_DAILY_QUOTA;
use music_partner_bot::testing::{fixtures, FakePartnerApi, RecordedCall, TEST_CSRF, TEST_SEED};
use music_partner_bot::utils::logging;
use music_partner_bot::{BotController, Config, CookieValidator, PartnerClient, SigningContext};

fn test_config() -> Config {
    Config {
        music_u: "test-music-u".to_string(),
        csrf: TEST_CSRF.to_string(),
        wait_time_min: 0.0,
        wait_time_max: 0.0,
        max_rate_limit_retries: 3,
        ..Config::default()
    }
}

fn controller(api: &FakePartnerApi) -> BotController<'_> {
    BotController::new(api, &test_config())
        .expect("创建控制器失败")
        .with_signing_context(SigningContext::with_seed(TEST_SEED, TEST_CSRF).expect("密钥无效"))
}

#[tokio::test]
async fn test_daily_batch_rates_pending_works_in_order() {
    let api = FakePartnerApi::new();
    api.set_daily_task(fixtures::daily_response(
        "daily-1",
        3,
        1,
        vec![
            fixtures::completed(fixtures::work("w1", "Hello", "Band"), 4),
            fixtures::pending(fixtures::work("w2", "晴天", "周杰伦")),
            fixtures::pending(fixtures::work("w3", "Yesterday", "披头士")),
        ],
    ));
    api.set_extra_list(fixtures::extra_queue_response(EXTRA_DAILY_QUOTA, Vec::new()));

    let report = controller(&api).run_with_report().await.expect("运行失败");

    assert!(!report.daily_complete);
    let daily = report.daily.expect("应处理每日任务");
    assert_eq!(daily.submitted, 2);
    assert_eq!(daily.already_rated, 1);

    assert_eq!(api.evaluated_work_ids(), vec!["w2", "w3"]);
    let evaluations = api.evaluations();
    assert_eq!(evaluations[0]["score"], "3");
    assert_eq!(evaluations[0]["tags"], "3-A-1");
    assert_eq!(evaluations[1]["score"], "4");
    assert_eq!(evaluations[1]["tags"], "4-A-1");
    for payload in &evaluations {
        assert_eq!(payload["taskId"], "daily-1");
        assert_eq!(payload["csrf_token"], TEST_CSRF);
        assert!(payload.get("extraResource").is_none());
    }
}

#[tokio::test]
async fn test_extra_quota_already_met() {
    let api = FakePartnerApi::new();
    api.set_extra_list(fixtures::extra_queue_response(
        7,
        vec![fixtures::work("e1", "Song", "A"), fixtures::work("e2", "歌", "人")],
    ));

    assert!(controller(&api).run().await);
    assert!(api.evaluations().is_empty());
    assert!(api.reports().is_empty());
}

#[tokio::test]
async fn test_extra_stops_when_remaining_quota_is_used() {
    let api = FakePartnerApi::new();
    api.set_daily_task(fixtures::daily_response("daily-2", 1, 1, Vec::new()));
    api.set_extra_list(fixtures::extra_queue_response(
        5,
        vec![
            fixtures::work("e1", "One", "A"),
            fixtures::work("e2", "Two", "B"),
            fixtures::work("e3", "Three", "C"),
            fixtures::work("e4", "Four", "D"),
        ],
    ));
    api.script_evaluation("e3", vec![ApiReply::error(500, "作品已下架")]);

    let report = controller(&api).run_with_report().await.expect("运行失败");

    assert_eq!(report.extra.remaining, 2);
    assert_eq!(report.extra.succeeded, 2);
    assert_eq!(report.extra.total_completed(), 7);
    assert_eq!(api.reported_work_ids(), vec!["e1", "e2"]);
    assert_eq!(api.evaluated_work_ids(), vec!["e1", "e2"]);

    // 上报在评分之前
    let calls = api.calls();
    let first_report = calls
        .iter()
        .position(|c| matches!(c, RecordedCall::ReportListen(_)))
        .expect("缺少上报");
    let first_evaluate = calls
        .iter()
        .position(|c| matches!(c, RecordedCall::Evaluate(_)))
        .expect("缺少评分");
    assert!(first_report < first_evaluate);

    for payload in api.evaluations() {
        assert_eq!(payload["extraResource"], "true");
        assert_eq!(payload["taskId"], "daily-2");
    }
}

#[tokio::test]
async fn test_rate_limited_submission_is_retried_with_same_payload() {
    let api = FakePartnerApi::new();
    api.set_daily_task(fixtures::daily_response(
        "daily-3",
        1,
        0,
        vec![fixtures::pending(fixtures::work("w1", "Song", "Singer"))],
    ));
    api.script_evaluation(
        "w1",
        vec![ApiReply::error(405, "操作过于频繁,请稍后再试"), ApiReply::ok()],
    );

    assert!(controller(&api).run().await);

    let evaluations = api.evaluations();
    assert_eq!(evaluations.len(), 2);
    assert_eq!(evaluations[0], evaluations[1]);
}

#[tokio::test]
async fn test_persistent_rate_limit_fails_run() {
    let api = FakePartnerApi::new();
    api.set_daily_task(fixtures::daily_response(
        "daily-4",
        1,
        0,
        vec![fixtures::pending(fixtures::work("w1", "Song", "Singer"))],
    ));
    api.script_evaluation("w1", vec![ApiReply::error(405, "操作过于频繁"); 10]);

    assert!(!controller(&api).run().await);
    // 首次 + 3 次重试
    assert_eq!(api.evaluations().len(), 4);
    assert!(!api.calls().contains(&RecordedCall::ExtraList));
}

#[tokio::test]
#[ignore] // 默认忽略，需要真实 Cookie：cargo test -- --ignored
async fn test_live_cookie_validation() {
    logging::init(true);

    let config = Config::load().expect("加载配置失败");
    let client = PartnerClient::new(&config).expect("创建客户端失败");

    let status = CookieValidator::new(&client, &config).validate().await;
    println!("Cookie 状态: {}", status);
    assert!(status.is_valid(), "Cookie 应该有效");
}
