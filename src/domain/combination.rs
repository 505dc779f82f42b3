// ==========================================
// 剪力墙结构分析客户端 - 荷载组合记录
// ==========================================
// 职责: 单条荷载组合的内力与安全系数
// 说明: 服务端计算权威，客户端只读；整表随一次成功获取原子替换
// ==========================================

use serde::{Deserialize, Serialize};

/// 单条荷载组合的计算结果
///
/// 一经获取即视为不可变；同一构件的组合列表只会被整体替换，
/// 不做逐条合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// 组合序号（服务端排序）
    pub index: u32,
    /// 组合短名（如 "C12"）
    pub name: String,
    /// 组合全名（含荷载工况表达式）
    pub full_name: String,
    /// 轴力
    #[serde(rename = "P")]
    pub p: f64,
    /// 绕 2 轴弯矩
    #[serde(rename = "M2")]
    pub m2: f64,
    /// 绕 3 轴弯矩
    #[serde(rename = "M3")]
    pub m3: f64,
    /// 2 方向剪力
    #[serde(rename = "V2")]
    pub v2: f64,
    /// 3 方向剪力
    #[serde(rename = "V3")]
    pub v3: f64,
    /// 受弯安全系数
    pub flexure_sf: f64,
    /// 组合受剪安全系数
    pub shear_sf_combined: f64,
    /// 组合受剪需求/能力比
    pub shear_dcr_combined: f64,
}

impl Combination {
    /// 受剪是否满足（DCR ≤ 1.0 视为通过）
    pub fn shear_passes(&self) -> bool {
        self.shear_dcr_combined <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_wire_format() {
        let json = r#"{
            "index": 3,
            "name": "C3",
            "full_name": "1.3DL + 1.5LL + 0.6WX",
            "P": -1250.0,
            "M2": 18.4,
            "M3": 431.2,
            "V2": 96.5,
            "V3": 4.1,
            "flexure_sf": 1.42,
            "shear_sf_combined": 1.18,
            "shear_dcr_combined": 0.85
        }"#;

        let combo: Combination = serde_json::from_str(json).unwrap();
        assert_eq!(combo.index, 3);
        assert_eq!(combo.name, "C3");
        assert_eq!(combo.p, -1250.0);
        assert!(combo.shear_passes());
    }

    #[test]
    fn test_shear_dcr_boundary() {
        let json = r#"{
            "index": 1, "name": "C1", "full_name": "1.0DL",
            "P": 0.0, "M2": 0.0, "M3": 0.0, "V2": 0.0, "V3": 0.0,
            "flexure_sf": 1.0, "shear_sf_combined": 1.0, "shear_dcr_combined": 1.0
        }"#;
        let combo: Combination = serde_json::from_str(json).unwrap();
        // DCR = 1.0 恰好通过
        assert!(combo.shear_passes());
    }
}
