//! 결과 집계 -- 호스트별 카운트와 교체 기록
//!
//! 각 패스는 [`PassResult`]를 만들고, [`ResultStore::merge`]로 병합합니다.
//! 카운트(monitored, updated)는 마지막 패스 값으로 덮어쓰며 누적하지 않습니다.
//! 교체 기록은 [`RecordRetention`] 정책에 따라 누적되거나 알림 성공 후 비워집니다.

use std::collections::HashMap;

use refit_core::config::RecordRetention;
use serde::Serialize;

use crate::types::ContainerSnapshot;

/// 한 컨테이너의 교체 기록
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementRecord {
    /// 교체 전 이미지 ID
    pub old_image: String,
    /// 교체 후 이미지 ID
    pub new_image: String,
    /// 교체된 기존 컨테이너 스냅샷
    pub old_container: ContainerSnapshot,
}

/// 한 패스의 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassResult {
    pub host: String,
    /// 필터 적용 후 대상 컨테이너 수
    pub monitored: usize,
    /// 시작까지 완료된 교체 수
    pub updated: usize,
    /// 이번 패스에서 생성된 교체 기록
    pub replacements: Vec<ReplacementRecord>,
}

impl PassResult {
    /// 아무것도 교체하지 않은 패스 결과를 생성합니다.
    pub fn empty(host: impl Into<String>, monitored: usize) -> Self {
        Self {
            host: host.into(),
            monitored,
            updated: 0,
            replacements: Vec::new(),
        }
    }
}

/// 호스트별 마지막 패스 카운트
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostCounters {
    pub monitored: usize,
    pub updated: usize,
}

/// 알림으로 전달되는 집계 보고서
///
/// 외부 알림 채널로 보낼 수 있도록 JSON 직렬화를 지원합니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub host: String,
    pub monitored: usize,
    pub updated: usize,
    /// 아직 알림되지 않은 교체 기록 (보존 정책에 따라 이전 패스 기록 포함)
    pub replacements: Vec<ReplacementRecord>,
}

/// 프로세스 수명 동안 유지되는 결과 저장소
///
/// 재시작 시 모든 값은 사라집니다.
#[derive(Debug, Default)]
pub struct ResultStore {
    counters: HashMap<String, HostCounters>,
    pending: Vec<ReplacementRecord>,
    retention: RecordRetention,
}

impl ResultStore {
    pub fn new(retention: RecordRetention) -> Self {
        Self {
            counters: HashMap::new(),
            pending: Vec::new(),
            retention,
        }
    }

    /// 패스 결과를 병합합니다.
    ///
    /// 해당 호스트의 카운트는 덮어쓰고, 교체 기록은 대기 목록 뒤에 추가합니다.
    pub fn merge(&mut self, result: PassResult) {
        self.counters.insert(
            result.host,
            HostCounters {
                monitored: result.monitored,
                updated: result.updated,
            },
        );
        self.pending.extend(result.replacements);
    }

    /// 호스트의 마지막 패스 카운트를 반환합니다.
    pub fn counters(&self, host: &str) -> Option<HostCounters> {
        self.counters.get(host).copied()
    }

    /// 알림 대기 중인 교체 기록
    pub fn pending(&self) -> &[ReplacementRecord] {
        &self.pending
    }

    pub fn retention(&self) -> RecordRetention {
        self.retention
    }

    /// 알림용 보고서를 생성합니다. 기록이 없는 호스트는 0 카운트로 보고합니다.
    pub fn report(&self, host: &str) -> PassReport {
        let counters = self.counters(host).unwrap_or_default();
        PassReport {
            host: host.to_owned(),
            monitored: counters.monitored,
            updated: counters.updated,
            replacements: self.pending.clone(),
        }
    }

    /// 알림 성공을 반영합니다. `DrainOnNotify` 정책이면 대기 기록을 비웁니다.
    pub fn mark_notified(&mut self) {
        if self.retention == RecordRetention::DrainOnNotify {
            self.pending.clear();
        }
    }
}
