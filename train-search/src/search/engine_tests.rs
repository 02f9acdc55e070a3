//! Unit tests for the train search engine.

use super::*;
use crate::catalog::fixtures::{self, code};
use crate::catalog::{CatalogDocument, CatalogError, CatalogSnapshot, SharedCatalog};
use crate::domain::{ClassAvailability, Station};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Mutex;
use std::time::Duration;

/// Catalog double that counts calls and can be made slow or broken.
///
/// Pinning is free and not counted; only data queries are.
#[derive(Clone)]
struct MockCatalog {
    snapshot: Arc<CatalogSnapshot>,
    generation: u64,
    delay: Option<Duration>,
    broken: bool,
    call_count: Arc<Mutex<usize>>,
}

impl MockCatalog {
    fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            generation: snapshot.generation(),
            snapshot: Arc::new(snapshot),
            delay: None,
            broken: false,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    fn at_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn catalog_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    async fn enter(&self) -> Result<(), CatalogError> {
        *self.call_count.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken {
            return Err(CatalogError::Invalid {
                message: "backing store offline".to_string(),
            });
        }
        Ok(())
    }
}

impl Versioned for MockCatalog {
    fn generation(&self) -> u64 {
        self.generation
    }
}

impl StationCatalog for MockCatalog {
    type Pinned = MockCatalog;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.clone())
    }

    async fn find_by_code(&self, code: StationCode) -> Result<Option<Arc<Station>>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.station(code))
    }

    async fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> Result<Vec<Arc<Station>>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.stations_in_box(&latitude, &longitude))
    }

    async fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<StationSummary>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.search_stations(text, limit))
    }
}

impl TrainCatalog for MockCatalog {
    type Pinned = MockCatalog;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.clone())
    }

    async fn find_between(
        &self,
        from: &HashSet<StationCode>,
        to: &HashSet<StationCode>,
    ) -> Result<Vec<Arc<Train>>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.trains_between(from, to))
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Arc<Train>>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.train(number))
    }

    async fn schedule(&self, number: &str) -> Result<Vec<ScheduleStop>, CatalogError> {
        self.enter().await?;
        Ok(self.snapshot.schedule_for(number))
    }
}

/// Station catalog that swaps in `replacement` on the shared catalog as soon
/// as a search makes its first box query.
#[derive(Clone)]
struct RefreshDuringSearch {
    catalog: SharedCatalog,
    replacement: Arc<Mutex<Option<CatalogDocument>>>,
}

/// What `RefreshDuringSearch` hands out when pinned.
#[derive(Clone)]
struct RefreshingView {
    view: Arc<CatalogSnapshot>,
    catalog: SharedCatalog,
    replacement: Arc<Mutex<Option<CatalogDocument>>>,
}

impl Versioned for RefreshDuringSearch {
    fn generation(&self) -> u64 {
        self.catalog.generation()
    }
}

impl Versioned for RefreshingView {
    fn generation(&self) -> u64 {
        self.view.generation()
    }
}

impl StationCatalog for RefreshDuringSearch {
    type Pinned = RefreshingView;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(RefreshingView {
            view: StationCatalog::pin(&self.catalog).await?,
            catalog: self.catalog.clone(),
            replacement: self.replacement.clone(),
        })
    }

    async fn find_by_code(&self, code: StationCode) -> Result<Option<Arc<Station>>, CatalogError> {
        self.catalog.find_by_code(code).await
    }

    async fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> Result<Vec<Arc<Station>>, CatalogError> {
        self.catalog.find_nearby_box(latitude, longitude).await
    }

    async fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<StationSummary>, CatalogError> {
        self.catalog.search_by_prefix_or_name(text, limit).await
    }
}

impl StationCatalog for RefreshingView {
    type Pinned = RefreshingView;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.clone())
    }

    async fn find_by_code(&self, code: StationCode) -> Result<Option<Arc<Station>>, CatalogError> {
        Ok(self.view.station(code))
    }

    async fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> Result<Vec<Arc<Station>>, CatalogError> {
        let hits = self.view.stations_in_box(&latitude, &longitude);
        let replacement = self.replacement.lock().unwrap().take();
        if let Some(document) = replacement {
            self.catalog.replace(document).await?;
        }
        Ok(hits)
    }

    async fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<StationSummary>, CatalogError> {
        Ok(self.view.search_stations(text, limit))
    }
}

fn engine_over(catalog: &MockCatalog) -> TrainSearchEngine<MockCatalog, MockCatalog> {
    TrainSearchEngine::new(catalog.clone(), catalog.clone(), SearchConfig::default())
}

fn fixture_engine() -> (TrainSearchEngine<MockCatalog, MockCatalog>, MockCatalog) {
    let catalog = MockCatalog::new(fixtures::snapshot());
    (engine_over(&catalog), catalog)
}

fn numbers(result: &SearchResult) -> Vec<&str> {
    result.trains.iter().map(|t| t.number.as_str()).collect()
}

fn codes(set: &StationSet) -> HashSet<StationCode> {
    set.iter().copied().collect()
}

fn set(items: &[&str]) -> HashSet<StationCode> {
    items.iter().map(|c| code(c)).collect()
}

#[tokio::test]
async fn bengaluru_chennai_example() {
    let document = CatalogDocument {
        stations: vec![
            fixtures::station("SBC", "KSR Bengaluru", 12.98, 77.59),
            fixtures::station("BNC", "Bengaluru Cantonment", 13.00, 77.55),
            fixtures::station("MAS", "MGR Chennai Central", 13.08, 80.28),
        ],
        trains: vec![fixtures::train(
            "12028",
            "SBC",
            "MAS",
            "06:00",
            "11:00",
            ClassAvailability::default().with(TicketClass::ChairCar, true),
        )],
        schedules: vec![],
    };
    let catalog = MockCatalog::new(CatalogSnapshot::build(document, 1).unwrap());
    let engine = engine_over(&catalog);

    assert_eq!(codes(&engine.resolve("SBC").await.unwrap()), set(&["SBC", "BNC"]));
    assert_eq!(codes(&engine.resolve("MAS").await.unwrap()), set(&["MAS"]));

    let result = engine.search(&SearchQuery::new("BNC", "MAS")).await.unwrap();
    assert_eq!(numbers(&result), vec!["12028"]);
    assert_eq!(result.trains[0].departure.to_string(), "06:00");
}

#[tokio::test]
async fn search_widens_both_endpoints() {
    let (engine, _) = fixture_engine();

    let result = engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();

    // Catalog order; YPR and MS trains come in through proximity.
    assert_eq!(
        numbers(&result),
        vec!["12028", "12608", "12658", "22626", "16021"]
    );
    assert_eq!(codes(&result.from_stations), set(&["SBC", "BNC", "YPR"]));
    assert_eq!(codes(&result.to_stations), set(&["MAS", "MS"]));
}

#[tokio::test]
async fn search_is_directional() {
    let (engine, _) = fixture_engine();

    let result = engine.search(&SearchQuery::new("MAS", "SBC")).await.unwrap();
    assert_eq!(numbers(&result), vec!["12639"]);
}

#[tokio::test]
async fn codes_are_trimmed_and_uppercased() {
    let (engine, _) = fixture_engine();

    let result = engine
        .search(&SearchQuery::new(" bnc ", "ms"))
        .await
        .unwrap();
    assert_eq!(result.len(), 5);
}

#[tokio::test]
async fn first_ac_filter_excludes_trains_without_it() {
    let (engine, _) = fixture_engine();

    let result = engine
        .search(&SearchQuery::new("SBC", "MAS").with_ticket_class("1A"))
        .await
        .unwrap();

    assert_eq!(numbers(&result), vec!["12608"]);
    assert!(!result.trains.iter().any(|t| t.number == "12028"));
}

#[tokio::test]
async fn every_result_has_requested_class() {
    let (engine, _) = fixture_engine();

    for class in TicketClass::ALL {
        let result = engine
            .search(&SearchQuery::new("SBC", "MAS").with_ticket_class(class.code()))
            .await
            .unwrap();
        assert!(
            result.trains.iter().all(|t| t.availability.has(class)),
            "class {class}"
        );
    }

    let third_ac = engine
        .search(&SearchQuery::new("SBC", "MAS").with_ticket_class("3a"))
        .await
        .unwrap();
    assert_eq!(numbers(&third_ac), vec!["12608", "12658", "16021"]);
}

#[tokio::test]
async fn blank_ticket_class_means_any() {
    let (engine, _) = fixture_engine();

    let result = engine
        .search(&SearchQuery::new("SBC", "MAS").with_ticket_class("  "))
        .await
        .unwrap();
    assert_eq!(result.len(), 5);
}

#[tokio::test]
async fn departure_slots_are_ored() {
    let (engine, _) = fixture_engine();

    let early = engine
        .search(&SearchQuery::new("SBC", "MAS").with_departure_slots(["slot1"]))
        .await
        .unwrap();
    assert_eq!(numbers(&early), vec!["12028"]);

    let early_or_late = engine
        .search(&SearchQuery::new("SBC", "MAS").with_departure_slots(["slot1", "slot5"]))
        .await
        .unwrap();
    assert_eq!(numbers(&early_or_late), vec!["12028", "12658"]);
}

#[tokio::test]
async fn arrival_slots_filter_after_departure_slots() {
    let (engine, _) = fixture_engine();

    let overnight = engine
        .search(&SearchQuery::new("SBC", "MAS").with_arrival_slots(["slot1"]))
        .await
        .unwrap();
    assert_eq!(numbers(&overnight), vec!["12658"]);

    let none = engine
        .search(
            &SearchQuery::new("SBC", "MAS")
                .with_departure_slots(["slot2"])
                .with_arrival_slots(["slot1"]),
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn empty_slot_sets_are_a_no_op() {
    let (engine, _) = fixture_engine();

    let plain = engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    let every_slot: Vec<&str> = TimeSlot::ALL.iter().map(|s| s.id()).collect();
    let all_slots = engine
        .search(
            &SearchQuery::new("SBC", "MAS")
                .with_departure_slots(every_slot.clone())
                .with_arrival_slots(every_slot),
        )
        .await
        .unwrap();
    let no_slots = engine
        .search(
            &SearchQuery::new("SBC", "MAS")
                .with_departure_slots(Vec::<String>::new())
                .with_arrival_slots(Vec::<String>::new()),
        )
        .await
        .unwrap();

    assert_eq!(numbers(&plain), numbers(&no_slots));
    assert_eq!(numbers(&plain), numbers(&all_slots));
}

#[tokio::test]
async fn date_does_not_change_results() {
    let (engine, _) = fixture_engine();
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let plain = engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    let dated = engine
        .search(&SearchQuery::new("SBC", "MAS").with_date(date))
        .await
        .unwrap();
    assert_eq!(numbers(&plain), numbers(&dated));
}

#[tokio::test]
async fn same_endpoint_returns_no_synthesized_trains() {
    let (engine, _) = fixture_engine();

    let result = engine.search(&SearchQuery::new("SBC", "SBC")).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn same_endpoint_returns_real_loops() {
    let mut document = fixtures::document();
    document.trains.push(fixtures::train(
        "06201",
        "SBC",
        "SBC",
        "09:00",
        "17:00",
        ClassAvailability::all(),
    ));
    let catalog = MockCatalog::new(CatalogSnapshot::build(document, 1).unwrap());
    let engine = engine_over(&catalog);

    let result = engine.search(&SearchQuery::new("SBC", "SBC")).await.unwrap();
    assert_eq!(numbers(&result), vec!["06201"]);
    assert!(result.trains[0].is_loop());
}

#[tokio::test]
async fn missing_endpoint_is_invalid_query() {
    let (engine, catalog) = fixture_engine();

    let err = engine.search(&SearchQuery::new("", "MAS")).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));

    let err = engine.search(&SearchQuery::new("SBC", "   ")).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));

    assert_eq!(catalog.catalog_call_count(), 0);
}

#[tokio::test]
async fn unknown_slot_is_rejected_before_catalog_access() {
    let (engine, catalog) = fixture_engine();

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS").with_departure_slots(["slot9"]))
        .await
        .unwrap_err();
    assert_eq!(err, SearchError::InvalidSlot(InvalidSlot("slot9".to_string())));

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS").with_arrival_slots(["slot2", "noon"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidSlot(_)));

    assert_eq!(catalog.catalog_call_count(), 0);
}

#[tokio::test]
async fn unknown_class_is_rejected_before_catalog_access() {
    let (engine, catalog) = fixture_engine();

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS").with_ticket_class("4A"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::InvalidTicketClass(InvalidTicketClass("4A".to_string()))
    );
    assert_eq!(catalog.catalog_call_count(), 0);
}

#[tokio::test]
async fn malformed_code_is_station_not_found() {
    let (engine, catalog) = fixture_engine();

    let err = engine
        .search(&SearchQuery::new("S-B-C", "MAS"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::StationNotFound {
            endpoint: Endpoint::From,
            code: "S-B-C".to_string(),
        }
    );
    assert_eq!(catalog.catalog_call_count(), 0);
}

#[tokio::test]
async fn unknown_station_names_its_endpoint() {
    let (engine, _) = fixture_engine();

    let err = engine
        .search(&SearchQuery::new("SBC", "XYZ"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::StationNotFound {
            endpoint: Endpoint::To,
            code: "XYZ".to_string(),
        }
    );
    assert_eq!(err.to_string(), "to station not found: XYZ");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn resolved_sets_are_memoised() {
    let (engine, catalog) = fixture_engine();

    engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    // Two endpoints, each a lookup and a box query, then the train query.
    assert_eq!(catalog.catalog_call_count(), 5);

    engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    assert_eq!(catalog.catalog_call_count(), 6);
}

#[tokio::test]
async fn refresh_during_search_does_not_mix_generations() {
    let catalog = SharedCatalog::from_snapshot(fixtures::snapshot());

    // Yesvantpur moves far north and its train is withdrawn.
    let mut replacement = fixtures::document();
    for station in &mut replacement.stations {
        if station.code == code("YPR") {
            station.latitude = 20.0;
        }
    }
    replacement.trains.retain(|t| t.number != "16021");

    let stations = RefreshDuringSearch {
        catalog: catalog.clone(),
        replacement: Arc::new(Mutex::new(Some(replacement))),
    };
    let engine = TrainSearchEngine::new(stations, catalog.clone(), SearchConfig::default());

    let during = engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    assert_eq!(catalog.generation(), 2);
    // Everything answered from generation 1: YPR still nearby, 16021 still runs.
    assert_eq!(codes(&during.from_stations), set(&["SBC", "BNC", "YPR"]));
    assert!(numbers(&during).contains(&"16021"));

    let after = engine.search(&SearchQuery::new("SBC", "MAS")).await.unwrap();
    assert_eq!(codes(&after.from_stations), set(&["SBC", "BNC"]));
    assert!(!numbers(&after).contains(&"16021"));
}

#[tokio::test]
async fn catalogs_at_different_generations_are_unavailable() {
    let stations = MockCatalog::new(fixtures::snapshot());
    let trains = MockCatalog::new(fixtures::snapshot()).at_generation(2);
    let engine = TrainSearchEngine::new(stations.clone(), trains.clone(), SearchConfig::default());

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::CatalogUnavailable("catalog changed during search".to_string())
    );
    assert!(err.is_retryable());
    assert_eq!(stations.catalog_call_count() + trains.catalog_call_count(), 0);
}

#[tokio::test]
async fn failed_resolution_is_not_memoised() {
    let (engine, catalog) = fixture_engine();

    engine.resolve("XYZ").await.unwrap_err();
    engine.resolve("XYZ").await.unwrap_err();
    assert_eq!(catalog.catalog_call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_catalog_is_unavailable() {
    let catalog = MockCatalog::new(fixtures::snapshot()).slow(Duration::from_secs(10));
    let engine = engine_over(&catalog);

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::CatalogUnavailable(_)));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("timed out after 2000ms"));
}

#[tokio::test]
async fn catalog_failure_is_unavailable() {
    let catalog = MockCatalog::new(fixtures::snapshot()).broken();
    let engine = engine_over(&catalog);

    let err = engine
        .search(&SearchQuery::new("SBC", "MAS"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::CatalogUnavailable(_)));

    let err = engine.autocomplete("chen").await.unwrap_err();
    assert!(matches!(err, SearchError::CatalogUnavailable(_)));

    let err = engine.schedule("12028").await.unwrap_err();
    assert!(matches!(err, SearchError::CatalogUnavailable(_)));
}

#[tokio::test]
async fn autocomplete_matches_code_and_name() {
    let (engine, _) = fixture_engine();

    let chennai: Vec<_> = engine
        .autocomplete("chennai")
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.code.to_string())
        .collect();
    assert_eq!(chennai, vec!["MAS", "MS"]);

    let by_code = engine.autocomplete("nd").await.unwrap();
    assert_eq!(by_code[0].code, code("NDLS"));
    assert_eq!(by_code[0].name, "New Delhi");
}

#[tokio::test]
async fn autocomplete_respects_limit_and_blank_text() {
    let catalog = MockCatalog::new(fixtures::snapshot());
    let engine = TrainSearchEngine::new(
        catalog.clone(),
        catalog.clone(),
        SearchConfig::default().with_autocomplete_limit(1),
    );

    assert_eq!(engine.autocomplete("beng").await.unwrap().len(), 1);
    let calls = catalog.catalog_call_count();

    assert!(engine.autocomplete("   ").await.unwrap().is_empty());
    assert_eq!(catalog.catalog_call_count(), calls);
}

#[tokio::test]
async fn schedule_lookup() {
    let (engine, _) = fixture_engine();

    let stops = engine.schedule("12028").await.unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0].station_code, code("SBC"));
    assert_eq!(stops[1].station_code, code("MAS"));

    // Known train without schedule rows
    assert!(engine.schedule("12608").await.unwrap().is_empty());

    assert_eq!(
        engine.schedule("99999").await.unwrap_err(),
        SearchError::TrainNotFound("99999".to_string())
    );
    assert!(matches!(
        engine.schedule(" ").await.unwrap_err(),
        SearchError::InvalidQuery(_)
    ));
}

#[tokio::test]
async fn train_lookup() {
    let (engine, _) = fixture_engine();

    let train = engine.train("12430").await.unwrap();
    assert_eq!(train.from_station_code, code("NDLS"));
    assert_eq!(train.duration_minutes(), 300);
}
