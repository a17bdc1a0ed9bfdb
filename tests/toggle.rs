//! 原文/译文切换测试

use std::time::Duration;

use page_translator::parsers::html::text_content;
use page_translator::translation::DisplayMode;

mod common;

use common::{engine_for, HtmlFixtures, ScriptedTranslator};

#[tokio::test(start_paused = true)]
async fn test_toggle_without_affordance_is_noop() {
    let engine = engine_for(&HtmlFixtures::tiered_page(), ScriptedTranslator::default());
    let before = text_content(&engine.page().body());

    assert_eq!(engine.toggle(), None);
    assert_eq!(text_content(&engine.page().body()), before);
    assert_eq!(engine.display_mode(), DisplayMode::Translated);
}

#[tokio::test(start_paused = true)]
async fn test_round_trip_and_idempotence() {
    let translator = ScriptedTranslator::default().failing("paragraph five");
    let engine = engine_for(&HtmlFixtures::tiered_page(), translator);
    let original = text_content(&engine.page().body());

    engine.start().await.unwrap();
    let translated = text_content(&engine.page().body());
    assert_ne!(translated, original);
    assert_eq!(engine.affordance().label(), Some("显示原文"));

    assert_eq!(engine.toggle(), Some(DisplayMode::Original));
    assert_eq!(text_content(&engine.page().body()), original);
    assert_eq!(engine.affordance().label(), Some("显示译文"));

    assert_eq!(engine.toggle(), Some(DisplayMode::Translated));
    assert_eq!(text_content(&engine.page().body()), translated);

    // 失败的段落在两种模式下都保持原文
    assert!(translated.contains("Hidden paragraph five"));
    assert!(!translated.contains("[ja] Hidden paragraph five"));

    // 翻译器在切换时没有被再次调用
    assert_eq!(engine.translator().call_count(), 6);
}

/// 显示原文期间完成的翻译只记录，不写入文档
#[tokio::test(start_paused = true)]
async fn test_completion_in_original_mode_is_deferred() {
    let engine = engine_for(&HtmlFixtures::visible_paragraphs(3), ScriptedTranslator::default());
    let original = text_content(&engine.page().body());

    let toggler = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.toggle(), Some(DisplayMode::Original));
    };
    let (run, ()) = tokio::join!(engine.start(), toggler);
    assert_eq!(run.unwrap().translated(), 3);

    assert_eq!(text_content(&engine.page().body()), original);

    assert_eq!(engine.toggle(), Some(DisplayMode::Translated));
    let text = text_content(&engine.page().body());
    assert!(text.contains("[ja] Paragraph number 0"));
    assert!(text.contains("[ja] Paragraph number 2"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_removes_affordance_and_restores() {
    let engine = engine_for(&HtmlFixtures::tiered_page(), ScriptedTranslator::default());
    let original = text_content(&engine.page().body());

    engine.start().await.unwrap();
    engine.stop();

    assert_eq!(text_content(&engine.page().body()), original);
    assert!(!engine.affordance().is_present());
    assert_eq!(engine.toggle(), None);
    assert_eq!(text_content(&engine.page().body()), original);
}
