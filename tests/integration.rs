//! End-to-end tests through the public API: corpus on disk, drop matrix
//! served over HTTP, query text in, report out.

use std::sync::Arc;

use material_sensei::{
    penguin::{
        DropMatrix, DropRecord, DropStore, HttpDropFeed, Ingestor, MemoryDropStore,
        RefreshStatus, SqliteDropStore, StaticDropFeed,
    },
    GameData, QueryOutcome, Sensei, SenseiConfig,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const CORPUS: &str = r#"{
    "materials": {
        "30011": {"material_id": "30011", "material_name": "源岩", "material_rarity": 1},
        "30012": {"material_id": "30012", "material_name": "固源岩", "material_rarity": 2},
        "30013": {"material_id": "30013", "material_name": "固源岩组", "material_rarity": 3}
    },
    "materials_map": {"源岩": "30011", "固源岩": "30012", "固源岩组": "30013"},
    "materials_made": {
        "30012": [{"use_material_id": "30011", "use_number": 3}],
        "30013": [{"use_material_id": "30012", "use_number": 5}]
    },
    "materials_source": {
        "30011": {"main_00-01": {"source_rate": "固定"}},
        "30012": {"main_01-07": {"source_rate": "固定"}, "act11d0_03": {"source_rate": "小概率"}}
    },
    "stages": {
        "main_00-01": {"stageId": "main_00-01", "code": "0-1", "name": "坍塌", "apCost": 6, "stageType": "MAIN"},
        "main_01-07": {"stageId": "main_01-07", "code": "1-7", "name": "暴君", "apCost": 6, "stageType": "MAIN"},
        "main_02-05": {"stageId": "main_02-05", "code": "2-5", "name": "代价", "apCost": 12, "stageType": "MAIN"},
        "act11d0_03": {"stageId": "act11d0_03", "code": "GT-3", "name": "选择", "apCost": 15, "stageType": "ACTIVITY"},
        "tough_10-03": {"stageId": "tough_10-03", "code": "10-3", "name": "烈焰", "apCost": 21, "stageType": "MAIN"}
    }
}"#;

fn record(stage_id: &str, item_id: &str, times: i64, quantity: i64) -> DropRecord {
    DropRecord {
        stage_id: stage_id.to_string(),
        item_id: item_id.to_string(),
        times,
        quantity,
        std_dev: 0.0,
        start: Some(1_556_676_000_000),
        end: None,
    }
}

fn corpus() -> Arc<GameData> {
    Arc::new(GameData::from_json(CORPUS).unwrap())
}

fn config_without_dict() -> SenseiConfig {
    SenseiConfig {
        dict_path: None,
        ..SenseiConfig::default()
    }
}

#[tokio::test]
async fn sentence_query_with_no_drop_data() {
    let data = Arc::new(
        GameData::from_json(
            r#"{
            "materials": {"30011": {"material_id": "30011", "material_name": "源岩"}},
            "materials_map": {"源岩": "30011"},
            "materials_source": {"30011": {"main_00-01": {"source_rate": "固定"}}},
            "stages": {"main_00-01": {"stageId": "main_00-01", "code": "0-1", "name": "坍塌", "apCost": 6}}
        }"#,
        )
        .unwrap(),
    );
    let sensei = Sensei::new(data, Arc::new(MemoryDropStore::new()), config_without_dict());
    sensei.rebuild_vocabulary();

    let matcher = sensei.matcher().unwrap();
    assert_eq!(matcher.resolve("帮我查下源岩的材料").as_deref(), Some("源岩"));

    let QueryOutcome::Found(report) = sensei.resolve_and_recommend("帮我查下源岩的材料").await
    else {
        panic!("expected a report");
    };
    assert_eq!(report.source.main.len(), 1);
    assert_eq!(report.source.main[0].code, "0-1");
    assert!(report.source.act.is_empty());
    assert!(report.recommend.is_empty());
}

#[tokio::test]
async fn http_feed_to_ranked_report() {
    let server = MockServer::start().await;
    let matrix = DropMatrix {
        matrix: vec![
            record("main_01-07_perm", "30012", 1000, 500),
            record("main_02-05", "30012", 1000, 1000),
            record("tough_10-03", "30012", 100, 100),
            record("act11d0_03", "30012", 0, 0),
            record("retired_stage", "30012", 100, 100),
            record("main_01-07", "30011", 100, 100),
        ],
    };
    Mock::given(method("GET"))
        .and(path("/PenguinStats/api/v2/result/matrix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&matrix))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryDropStore::new());
    let feed = HttpDropFeed::new(format!(
        "{}/PenguinStats/api/v2/result/matrix",
        server.uri()
    ))
    .unwrap();
    let ingestor = Ingestor::new(Arc::new(feed), store.clone());
    assert_eq!(ingestor.refresh().await, RefreshStatus::Replaced { rows: 6 });

    let sensei = Sensei::new(corpus(), store, config_without_dict());
    sensei.rebuild_vocabulary();

    let QueryOutcome::Found(report) = sensei.resolve_and_recommend("固源岩怎么刷").await else {
        panic!("expected a report");
    };
    assert_eq!(report.name, "固源岩");
    assert_eq!(report.children[0].material.material_name, "源岩");
    assert_eq!(report.source.main[0].code, "1-7");
    assert_eq!(report.source.act[0].code, "GT-3");

    // 1-7: 6 AP at 0.5 => 12; 2-5: 12 AP at 1.0 => 12; 10-3: 21 AP at 1.0 => 21.
    // Equal costs keep rate order (2-5 has the higher rate).
    let order: Vec<_> = report.recommend.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(order, vec!["2-5", "1-7", "10-3"]);
    assert_eq!(report.recommend[2].name, "烈焰（磨难）");
    assert!(report
        .recommend
        .iter()
        .all(|r| r.desired.is_some_and(f64::is_finite)));
}

#[tokio::test]
async fn saved_matrix_file_seeds_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matrix.json");
    let matrix = DropMatrix {
        matrix: vec![record("main_02-05", "30012", 10, 10)],
    };
    std::fs::write(&path, serde_json::to_string(&matrix).unwrap()).unwrap();

    let store = Arc::new(MemoryDropStore::new());
    let feed = StaticDropFeed::from_file(&path).unwrap();
    let ingestor = Ingestor::new(Arc::new(feed), store.clone());
    assert_eq!(ingestor.refresh().await, RefreshStatus::Replaced { rows: 1 });

    let sensei = Sensei::new(corpus(), store, config_without_dict());
    let report = sensei.check_material("固源岩").await.unwrap();
    assert_eq!(report.recommend[0].code, "2-5");
    assert_eq!(report.recommend[0].desired, Some(12.0));
}

#[tokio::test]
async fn failed_refresh_keeps_serving_old_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryDropStore::with_records(vec![record(
        "main_01-07",
        "30012",
        10,
        10,
    )]));
    let ingestor = Ingestor::new(Arc::new(HttpDropFeed::new(server.uri()).unwrap()), store.clone());
    assert_eq!(ingestor.refresh().await, RefreshStatus::Failed);

    let sensei = Sensei::new(corpus(), store, config_without_dict());
    let report = sensei.check_material("固源岩").await.unwrap();
    assert_eq!(report.recommend.len(), 1);
}

#[tokio::test]
async fn sqlite_store_serves_the_same_ranking() {
    let store = Arc::new(SqliteDropStore::in_memory().await.unwrap());
    let ingestor = Ingestor::new(
        Arc::new(StaticDropFeed::new(DropMatrix {
            matrix: vec![
                record("main_01-07", "30012", 100, 50),
                record("main_02-05", "30012", 100, 50),
            ],
        })),
        store.clone(),
    );
    assert_eq!(ingestor.refresh().await, RefreshStatus::Replaced { rows: 2 });

    let sensei = Sensei::new(corpus(), store, config_without_dict());
    let report = sensei.check_material("固源岩").await.unwrap();
    let order: Vec<_> = report.recommend.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(order, vec!["1-7", "2-5"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_an_empty_table_during_refresh() {
    let store = Arc::new(MemoryDropStore::new());
    let rows: Vec<_> = (0..500)
        .map(|i| record("main_01-07", "30012", 100 + i, 50))
        .collect();
    let ingestor = Arc::new(Ingestor::new(
        Arc::new(StaticDropFeed::new(DropMatrix { matrix: rows })),
        store.clone(),
    ));
    ingestor.refresh().await;

    let writer = {
        let ingestor = Arc::clone(&ingestor);
        tokio::spawn(async move {
            for _ in 0..200 {
                ingestor.refresh().await;
                tokio::task::yield_now().await;
            }
        })
    };

    let sensei = Arc::new(Sensei::new(corpus(), store.clone(), config_without_dict()));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let sensei = Arc::clone(&sensei);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let report = sensei.check_material("固源岩").await.unwrap();
                assert_eq!(report.recommend.len(), 10);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(store.len().await.unwrap(), 500);
}

#[tokio::test]
async fn startup_writes_dictionary_and_becomes_ready() {
    let dir = tempfile::tempdir().unwrap();
    let dict = dir.path().join("materials.txt");
    let config = SenseiConfig {
        dict_path: Some(dict.clone()),
        ..SenseiConfig::default()
    };
    let store = Arc::new(MemoryDropStore::new());
    let sensei = Arc::new(Sensei::new(corpus(), store, config));

    let tasks = sensei.start(Arc::new(StaticDropFeed::default()));
    sensei.wait_ready().await;
    tasks.vocabulary.await.unwrap();
    tasks.refresh.abort();

    let written = std::fs::read_to_string(&dict).unwrap();
    assert_eq!(written, "源岩 500 n\n固源岩 500 n\n固源岩组 500 n");
    assert!(matches!(
        sensei.resolve_and_recommend("固源岩组").await,
        QueryOutcome::Found(_)
    ));
}
