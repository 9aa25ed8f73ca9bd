//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 업데이터는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `refit_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 호스트 레이블 키 (엔진 주소)
pub const LABEL_HOST: &str = "host";

/// 교체 단계 레이블 키 (inspect, pull, stop, remove, create, start, remove_image)
pub const LABEL_STEP: &str = "step";

// ─── Updater 메트릭 ─────────────────────────────────────────────────

/// Updater: 실행된 패스 수 (counter)
pub const UPDATER_PASSES_TOTAL: &str = "refit_updater_passes_total";

/// Updater: 마지막 패스에서 감시한 컨테이너 수 (gauge, label: host)
pub const UPDATER_MONITORED_CONTAINERS: &str = "refit_updater_monitored_containers";

/// Updater: 새 이미지로 교체된 컨테이너 수 (counter, label: host)
pub const UPDATER_UPDATED_CONTAINERS_TOTAL: &str = "refit_updater_updated_containers_total";

/// Updater: 이미지 pull 실패 수 (counter)
pub const UPDATER_PULL_FAILURES_TOTAL: &str = "refit_updater_pull_failures_total";

/// Updater: 교체 단계별 실패 수 (counter, label: step)
pub const UPDATER_STEP_FAILURES_TOTAL: &str = "refit_updater_step_failures_total";

/// Updater: 패스 소요 시간 (histogram, 초)
pub const UPDATER_PASS_DURATION_SECONDS: &str = "refit_updater_pass_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 패스 소요 시간 히스토그램 버킷 (초)
///
/// 이미지 pull이 포함되므로 100ms ~ 600s 범위
pub const PASS_DURATION_BUCKETS: [f64; 9] = [0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 180.0, 600.0];

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(UPDATER_PASSES_TOTAL, "Total number of update passes run");
    describe_gauge!(
        UPDATER_MONITORED_CONTAINERS,
        "Containers in scope during the last pass"
    );
    describe_counter!(
        UPDATER_UPDATED_CONTAINERS_TOTAL,
        "Containers replaced with a newer image"
    );
    describe_counter!(
        UPDATER_PULL_FAILURES_TOTAL,
        "Image pulls that failed during a pass"
    );
    describe_counter!(
        UPDATER_STEP_FAILURES_TOTAL,
        "Failed engine calls per replacement step"
    );
    describe_histogram!(
        UPDATER_PASS_DURATION_SECONDS,
        "Wall-clock duration of an update pass in seconds"
    );
}
