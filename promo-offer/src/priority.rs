use crate::models::Priority;

pub fn assign(discount: u8) -> Priority {
    if discount >= 50 {
        Priority::High
    } else if discount >= 30 {
        Priority::Normal
    } else {
        Priority::Low
    }
}
