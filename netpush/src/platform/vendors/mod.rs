//! Built-in vendor dialects.
//!
//! | Tag            | Family | Privileged step | Commit | Save |
//! |----------------|--------|-----------------|--------|------|
//! | `cisco_ios`    | Cisco  | `enable`        | no     | no   |
//! | `cisco_xe`     | Cisco  | `enable`        | no     | no   |
//! | `cisco_nxos`   | Cisco  | none            | no     | no   |
//! | `huawei`       | Huawei | none            | yes    | yes  |
//! | `huawei_vrpv8` | Huawei | none            | yes    | yes  |

pub mod cisco;
pub mod huawei;
