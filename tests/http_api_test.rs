// HTTP API 集成测试
//
// 使用完整路由配置 + 内存数据源，不依赖 PostgreSQL

mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use common::{engine, ingestor, MemorySink, MemoryStore};
use gamegrid::service::http::handlers::AppState;
use gamegrid::service::http::routes;

const CSV_BODY: &str = "AppID,Name,Release date,Required age,Price,DLC count,About the game,\
Supported languages,Windows,Mac,Linux,Positive,Negative,Score rank,Developers,Publishers,\
Categories,Genres,Tags\n\
730,Counter-Strike 2,\"Aug 21, 2012\",17,0.0,1,Team shooter.,\"['English', 'German']\",True,False,True,100,20,,Valve,Valve,\"['Multi-player', 'PvP']\",\"['Action', 'Free To Play']\",\"['FPS', 'Shooter']\"\n\
570,Dota 2,\"Jul 9, 2013\",0,0.0,0,MOBA.,['English'],True,True,True,90,15,,Valve,Valve,['Multi-player'],['Strategy'],['MOBA']\n";

fn state(store: Arc<MemoryStore>, sink: Arc<MemorySink>) -> web::Data<Arc<AppState>> {
    web::Data::new(Arc::new(AppState::new(
        Arc::new(engine(store)),
        Arc::new(ingestor(sink)),
    )))
}

/// 单次响应的 CSV 文件服务器，返回下载地址
async fn serve_csv_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/games.csv", addr)
}

#[actix_web::test]
async fn test_data_route_returns_page_envelope() {
    let store = Arc::new(MemoryStore::with_games(200));
    let app = test::init_service(
        App::new()
            .app_data(state(store, Arc::new(MemorySink::default())))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/data")
        .set_json(json!({
            "startRow": 0,
            "endRow": 50,
            "rowGroupCols": [],
            "groupKeys": [],
            "filterModel": {},
            "sortModel": []
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Data fetched successfully"));
    assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 50);
    assert_eq!(body["data"]["rowCount"], json!(-1));
}

#[actix_web::test]
async fn test_data_route_rejects_bad_identifier() {
    let store = Arc::new(MemoryStore::with_games(10));
    let app = test::init_service(
        App::new()
            .app_data(state(store.clone(), Arc::new(MemorySink::default())))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/data")
        .set_json(json!({"sortModel": [{"colId": "price; DELETE FROM game_data", "sort": "asc"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"]["code"], json!(400));
    assert!(store.queries().is_empty());
}

#[actix_web::test]
async fn test_upload_csv_ingests_rows() {
    let sink = Arc::new(MemorySink::default());
    let app = test::init_service(
        App::new()
            .app_data(state(Arc::new(MemoryStore::with_games(0)), sink.clone()))
            .configure(routes::configure),
    )
    .await;

    let link = serve_csv_once(CSV_BODY).await;
    let req = test::TestRequest::post()
        .uri("/upload-csv")
        .set_json(json!({ "csv_link": link }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("CSV data uploaded successfully"));
    assert_eq!(body["data"]["rows_written"], json!(2));

    let written = sink.written.lock().unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].appid, 730);
    assert_eq!(written[0].tags, json!(["FPS", "Shooter"]));
    assert!(written[1].mac);
}

#[actix_web::test]
async fn test_upload_csv_unreachable_link_is_400() {
    let sink = Arc::new(MemorySink::default());
    let app = test::init_service(
        App::new()
            .app_data(state(Arc::new(MemoryStore::with_games(0)), sink.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/upload-csv")
        .set_json(json!({ "csv_link": "http://127.0.0.1:1/missing.csv" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(sink.written.lock().unwrap().is_empty());
}
